mod accounts_tests;
mod import_export_tests;
mod properties_tests;
