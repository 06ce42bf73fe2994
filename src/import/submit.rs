use serde::Serialize;

use crate::domain::listing::{Listing, ListingDraft};
use crate::errors::ServerError;
use crate::import::validate::ImportedRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFailure {
    /// 1-based position in the batch.
    pub position: usize,
    pub row_number: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReport {
    pub success_count: usize,
    pub fail_count: usize,
    pub errors: Vec<SubmitFailure>,
    pub created_ids: Vec<i64>,
}

/// Submit each row through `create`, one at a time. A failure is recorded
/// and the next row is still submitted; nothing already created is undone.
pub fn submit_all<F>(rows: &[ImportedRow], mut create: F) -> SubmitReport
where
    F: FnMut(&ListingDraft) -> Result<Listing, ServerError>,
{
    let mut report = SubmitReport::default();

    for (idx, row) in rows.iter().enumerate() {
        match create(&row.draft) {
            Ok(listing) => {
                report.success_count += 1;
                report.created_ids.push(listing.id);
            }
            Err(e) => {
                tracing::warn!(row = row.row_number, error = %e, "import row rejected");
                report.fail_count += 1;
                report.errors.push(SubmitFailure {
                    position: idx + 1,
                    row_number: row.row_number,
                    message: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        success = report.success_count,
        failed = report.fail_count,
        "bulk submit finished"
    );
    report
}
