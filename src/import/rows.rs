use crate::spreadsheets::template::{COMMENT_MARKERS, LISTING_COLUMNS};

/// One sheet row as text cells, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based position in the sheet.
    pub row_number: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new<I, S>(row_number: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            row_number,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    /// Trimmed cell text; missing cells read as empty.
    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(|c| c.trim()).unwrap_or("")
    }

    /// Blank rows, comment rows and repeated header rows carry no record.
    pub fn is_skippable(&self) -> bool {
        if self.cells.iter().all(|c| c.trim().is_empty()) {
            return true;
        }
        let first = self.cell(0);
        COMMENT_MARKERS.iter().any(|m| first.starts_with(m)) || first == LISTING_COLUMNS[0]
    }
}
