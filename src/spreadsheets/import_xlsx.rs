use calamine::{Reader, Xlsx};
use std::io::Cursor;

use crate::errors::ServerError;
use crate::import::RawRow;

/// Every row of the first worksheet as text, numbered by absolute sheet
/// position (row 1 is the first sheet row even when the used range starts lower).
pub fn read_xlsx_rows(bytes: &[u8]) -> Result<Vec<RawRow>, ServerError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| ServerError::BadRequest(format!("not a readable xlsx file: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ServerError::BadRequest("workbook has no worksheets".into()))?
        .map_err(|e| ServerError::BadRequest(format!("cannot read first worksheet: {e}")))?;

    let Some((start_row, start_col)) = range.start() else {
        return Ok(Vec::new());
    };

    let rows = range
        .rows()
        .enumerate()
        .map(|(idx, cells)| {
            let leading = std::iter::repeat(String::new()).take(start_col as usize);
            let text = cells.iter().map(|c| c.to_string().trim().to_string());
            RawRow::new(start_row as usize + idx + 1, leading.chain(text))
        })
        .collect();

    Ok(rows)
}
