use csv::ReaderBuilder;

use crate::errors::ServerError;
use crate::import::RawRow;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV in the same layout as the xlsx template. Header rows are kept and
/// numbered so row numbers match the sheet the file was saved from.
pub fn read_csv_rows(bytes: &[u8]) -> Result<Vec<RawRow>, ServerError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // rows may have fewer cells than the header
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| ServerError::BadRequest(format!("csv row {}: {e}", idx + 1)))?;
        rows.push(RawRow::new(idx + 1, record.iter().map(str::trim)));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vocabulary::BuildingVocabulary;
    use crate::import::validate_rows;

    #[test]
    fn csv_rows_validate_like_sheet_rows() {
        let csv = "\u{FEFF}건물명,동/타입,호수,보증금,월세\n\
                   ※ 안내,,,,\n\
                   해링턴타워,101동,1203,\"1,000\",80\n\
                   KCC하버뷰,103동\n";
        let rows = read_csv_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].cell(0), "건물명");

        let report = validate_rows(&rows, &BuildingVocabulary::default());
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].row_number, 3);
        assert_eq!(report.records[0].draft.deposit, 1000);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.starts_with("row 4: "));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = read_csv_rows(&[0xC0, 0xAF, b',', b'x', b'\n']).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
