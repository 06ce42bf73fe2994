use rust_xlsxwriter::Workbook;

use crate::domain::listing::Listing;
use crate::domain::vocabulary::BuildingVocabulary;
use crate::errors::ServerError;
use crate::spreadsheets::template::{
    put, write_header_rows, write_vocabulary_sheet, COL_ACCESS_CODE, COL_AMENITIES, COL_BUILDING,
    COL_CONTACT, COL_DEPOSIT, COL_MOVE_IN, COL_NOTES, COL_RENT, COL_STATUS, COL_SUB_TYPE,
    COL_UNIT, HEADER_ROWS, LISTING_COLUMNS,
};

pub const EXTRA_COLUMNS: [&str; 2] = ["No.", "등록일"];

/// Export in import layout; serial number and creation date go after the
/// listing columns so the file can be re-imported as is.
pub fn export_listings_xlsx(
    listings: &[Listing],
    vocabulary: &BuildingVocabulary,
) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name("매물")
            .map_err(|e| ServerError::XlsxError(format!("Failed to name sheet: {e}")))?;
        write_header_rows(worksheet, vocabulary, &EXTRA_COLUMNS)?;

        let serial_col = LISTING_COLUMNS.len() as u16;

        for (i, listing) in listings.iter().enumerate() {
            let r = HEADER_ROWS + i as u32;
            let f = &listing.fields;

            put(worksheet, r, COL_BUILDING as u16, &f.building_name)?;
            put(worksheet, r, COL_SUB_TYPE as u16, &f.sub_type)?;
            put(worksheet, r, COL_UNIT as u16, &f.unit_label)?;

            worksheet
                .write_number(r, COL_DEPOSIT as u16, f.deposit as f64)
                .map_err(|e| ServerError::XlsxError(format!("Failed to write deposit: {e}")))?;
            worksheet
                .write_number(r, COL_RENT as u16, f.monthly_rent as f64)
                .map_err(|e| ServerError::XlsxError(format!("Failed to write rent: {e}")))?;

            put(worksheet, r, COL_ACCESS_CODE as u16, &f.access_code)?;
            put(worksheet, r, COL_MOVE_IN as u16, f.move_in.label())?;
            put(worksheet, r, COL_STATUS as u16, f.status.label())?;
            put(worksheet, r, COL_CONTACT as u16, &f.contact)?;

            let amenities: Vec<&str> = f.amenities.iter().map(String::as_str).collect();
            put(worksheet, r, COL_AMENITIES as u16, &amenities.join(", "))?;
            put(worksheet, r, COL_NOTES as u16, &f.notes)?;

            worksheet
                .write_number(r, serial_col, (i + 1) as f64)
                .map_err(|e| ServerError::XlsxError(format!("Failed to write serial: {e}")))?;
            put(
                worksheet,
                r,
                serial_col + 1,
                &listing.created_at.format("%Y-%m-%d").to_string(),
            )?;
        }
    }
    write_vocabulary_sheet(&mut workbook, vocabulary)?;

    let buffer = workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {e}")))?;

    tracing::info!(rows = listings.len(), bytes = buffer.len(), "listings exported");
    Ok(buffer)
}

/// `listings_YYYYMMDD.xlsx`
pub fn export_filename(today: chrono::NaiveDate) -> String {
    format!("listings_{}.xlsx", today.format("%Y%m%d"))
}
