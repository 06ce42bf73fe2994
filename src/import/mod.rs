//! Bulk import: sheet rows → validated drafts → sequential submission.

use serde::Serialize;

pub mod rows;
pub mod submit;
pub mod validate;

pub use rows::RawRow;
pub use submit::{submit_all, SubmitFailure, SubmitReport};
pub use validate::{validate_rows, ImportReport, ImportedRow};

/// A validation failure tied to its sheet row (1-based, header rows included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

impl RowError {
    pub fn new(row: usize, message: impl std::fmt::Display) -> Self {
        Self {
            row,
            message: format!("row {row}: {message}"),
        }
    }
}
