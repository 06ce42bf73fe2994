use crate::domain::listing::{Amenities, ListingDraft, ListingStatus, MoveIn};
use crate::domain::vocabulary::BuildingVocabulary;
use crate::import::rows::RawRow;
use crate::import::RowError;
use crate::spreadsheets::template as col;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedRow {
    pub row_number: usize,
    pub draft: ListingDraft,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub records: Vec<ImportedRow>,
    /// Sheet order.
    pub errors: Vec<RowError>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate every row. A bad row is reported and skipped; the rest still go
/// through.
pub fn validate_rows(rows: &[RawRow], vocabulary: &BuildingVocabulary) -> ImportReport {
    let mut report = ImportReport::default();

    for row in rows.iter().filter(|r| !r.is_skippable()) {
        match validate_row(row, vocabulary) {
            Ok(draft) => report.records.push(ImportedRow {
                row_number: row.row_number,
                draft,
            }),
            Err(message) => report.errors.push(RowError::new(row.row_number, message)),
        }
    }

    tracing::debug!(
        valid = report.records.len(),
        invalid = report.errors.len(),
        "import rows validated"
    );
    report
}

fn validate_row(row: &RawRow, vocabulary: &BuildingVocabulary) -> Result<ListingDraft, String> {
    let building = row.cell(col::COL_BUILDING);
    let sub_type = row.cell(col::COL_SUB_TYPE);
    if building.is_empty() || sub_type.is_empty() {
        return Err("building and sub-type required".into());
    }
    vocabulary
        .check(building, sub_type)
        .map_err(|e| e.to_string())?;

    let move_in = match row.cell(col::COL_MOVE_IN) {
        "" => MoveIn::default(),
        raw => MoveIn::parse(raw).ok_or_else(|| {
            format!("unknown move-in value '{raw}' (valid: {})", labels(MoveIn::ALL.map(MoveIn::label)))
        })?,
    };
    let status = match row.cell(col::COL_STATUS) {
        "" => ListingStatus::default(),
        raw => ListingStatus::parse(raw).ok_or_else(|| {
            format!(
                "unknown status '{raw}' (valid: {})",
                labels(ListingStatus::ALL.map(ListingStatus::label))
            )
        })?,
    };

    let deposit = parse_amount(row.cell(col::COL_DEPOSIT)).map_err(|raw| {
        format!("deposit must be a non-negative integer, got '{raw}'")
    })?;
    let monthly_rent = parse_amount(row.cell(col::COL_RENT)).map_err(|raw| {
        format!("monthly rent must be a non-negative integer, got '{raw}'")
    })?;

    Ok(ListingDraft {
        building_name: building.to_string(),
        sub_type: sub_type.to_string(),
        unit_label: row.cell(col::COL_UNIT).to_string(),
        deposit,
        monthly_rent,
        access_code: row.cell(col::COL_ACCESS_CODE).to_string(),
        move_in,
        status,
        amenities: split_amenities(row.cell(col::COL_AMENITIES)),
        notes: row.cell(col::COL_NOTES).to_string(),
        contact: row.cell(col::COL_CONTACT).to_string(),
    })
}

fn labels<const N: usize>(all: [&str; N]) -> String {
    all.join(", ")
}

/// Empty → 0. Accepts `1,500` and the `500.0` form spreadsheet cells produce.
/// Returns the offending text on failure.
fn parse_amount(raw: &str) -> Result<i64, &str> {
    if raw.is_empty() {
        return Ok(0);
    }
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();

    if let Ok(n) = cleaned.parse::<i64>() {
        return if n >= 0 { Ok(n) } else { Err(raw) };
    }
    match cleaned.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < i64::MAX as f64 => {
            Ok(f as i64)
        }
        _ => Err(raw),
    }
}

pub fn split_amenities(raw: &str) -> Amenities {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
