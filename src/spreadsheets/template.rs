//! Sheet layout shared by the import template, the export and the readers.
//!
//! Row 1 holds the column headers, row 2 the fill-in instructions, data
//! starts on row 3.

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::domain::listing::{ListingStatus, MoveIn};
use crate::domain::vocabulary::BuildingVocabulary;
use crate::errors::ServerError;

pub const HEADER_ROWS: u32 = 2;

pub const LISTING_COLUMNS: [&str; 11] = [
    "건물명",
    "동/타입",
    "호수",
    "보증금",
    "월세",
    "비밀번호",
    "전입유무",
    "상태",
    "연락처",
    "옵션",
    "메모",
];

pub const COL_BUILDING: usize = 0;
pub const COL_SUB_TYPE: usize = 1;
pub const COL_UNIT: usize = 2;
pub const COL_DEPOSIT: usize = 3;
pub const COL_RENT: usize = 4;
pub const COL_ACCESS_CODE: usize = 5;
pub const COL_MOVE_IN: usize = 6;
pub const COL_STATUS: usize = 7;
pub const COL_CONTACT: usize = 8;
pub const COL_AMENITIES: usize = 9;
pub const COL_NOTES: usize = 10;

/// A first cell starting with one of these marks a row the importer ignores.
pub const COMMENT_MARKERS: [&str; 2] = ["#", "※"];

pub(crate) fn put(ws: &mut Worksheet, row: u32, col: u16, text: &str) -> Result<(), ServerError> {
    ws.write_string(row, col, text)
        .map(|_| ())
        .map_err(|e| ServerError::XlsxError(format!("Failed to write cell ({row}, {col}): {e}")))
}

pub(crate) fn put_with(
    ws: &mut Worksheet,
    row: u32,
    col: u16,
    text: &str,
    format: &Format,
) -> Result<(), ServerError> {
    ws.write_string_with_format(row, col, text, format)
        .map(|_| ())
        .map_err(|e| ServerError::XlsxError(format!("Failed to write cell ({row}, {col}): {e}")))
}

/// Instruction text for row 2, one entry per listing column.
pub fn instructions(vocabulary: &BuildingVocabulary) -> [String; 11] {
    let buildings: Vec<&str> = vocabulary.building_names().collect();
    let move_in: Vec<&str> = MoveIn::ALL.iter().map(|m| m.label()).collect();
    let status: Vec<&str> = ListingStatus::ALL.iter().map(|s| s.label()).collect();

    [
        format!("※ 필수: {}", buildings.join("/")),
        "필수 (건물별 목록 시트 참고)".to_string(),
        String::new(),
        "숫자 (만원)".to_string(),
        "숫자 (만원)".to_string(),
        String::new(),
        format!("{} (기본 {})", move_in.join("/"), MoveIn::default()),
        format!("{} (기본 {})", status.join("/"), ListingStatus::default()),
        String::new(),
        "쉼표로 구분".to_string(),
        String::new(),
    ]
}

/// Write rows 1 and 2 to `ws`, plus any `extra` headers after the listing
/// columns.
pub(crate) fn write_header_rows(
    ws: &mut Worksheet,
    vocabulary: &BuildingVocabulary,
    extra: &[&str],
) -> Result<(), ServerError> {
    let bold = Format::new().set_bold();
    let hint = Format::new().set_italic();

    for (col, header) in LISTING_COLUMNS.iter().chain(extra.iter()).enumerate() {
        put_with(ws, 0, col as u16, header, &bold)?;
    }
    for (col, text) in instructions(vocabulary).iter().enumerate() {
        if !text.is_empty() {
            put_with(ws, 1, col as u16, text, &hint)?;
        }
    }

    ws.set_freeze_panes(HEADER_ROWS, 0)
        .map_err(|e| ServerError::XlsxError(format!("Failed to freeze header rows: {e}")))?;
    Ok(())
}

/// Second sheet listing every building with its valid sub-types.
pub(crate) fn write_vocabulary_sheet(
    workbook: &mut Workbook,
    vocabulary: &BuildingVocabulary,
) -> Result<(), ServerError> {
    let ws = workbook.add_worksheet();
    ws.set_name("건물별 목록")
        .map_err(|e| ServerError::XlsxError(format!("Failed to name sheet: {e}")))?;

    let bold = Format::new().set_bold();
    put_with(ws, 0, 0, LISTING_COLUMNS[COL_BUILDING], &bold)?;
    put_with(ws, 0, 1, LISTING_COLUMNS[COL_SUB_TYPE], &bold)?;

    let mut row = 1;
    for building in vocabulary.building_names() {
        for sub_type in vocabulary.sub_types(building).unwrap_or_default() {
            put(ws, row, 0, building)?;
            put(ws, row, 1, sub_type)?;
            row += 1;
        }
    }
    Ok(())
}

/// Blank import template: header rows on the first sheet, vocabulary on the second.
pub fn template_xlsx(vocabulary: &BuildingVocabulary) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    {
        let ws = workbook.add_worksheet();
        ws.set_name("매물")
            .map_err(|e| ServerError::XlsxError(format!("Failed to name sheet: {e}")))?;
        write_header_rows(ws, vocabulary, &[])?;
    }
    write_vocabulary_sheet(&mut workbook, vocabulary)?;

    workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {e}")))
}
