pub mod export_xlsx;
pub mod import_csv;
pub mod import_xlsx;
pub mod template;

pub use export_xlsx::{export_filename, export_listings_xlsx};
pub use import_csv::read_csv_rows;
pub use import_xlsx::read_xlsx_rows;
pub use template::template_xlsx;
