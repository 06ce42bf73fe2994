use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::domain::filter::ListingFilter;
use crate::domain::listing::{Amenities, Listing, ListingDraft};
use crate::errors::ServerError;

const SELECT_COLUMNS: &str = "id, building_name, sub_type, unit_label, deposit, monthly_rent, \
     access_code, move_in, status, amenities, notes, contact, created_at, deleted";

/// Build the list query for `filter`: a parameterized `WHERE` clause,
/// newest first.
pub fn build_list_query(filter: &ListingFilter) -> (String, Vec<Value>) {
    let mut sql = format!("SELECT {SELECT_COLUMNS} FROM properties WHERE 1=1");
    let mut args: Vec<Value> = Vec::new();

    if !filter.include_deleted {
        sql.push_str(" AND deleted = 0");
    }
    if let Some(b) = &filter.building_name {
        sql.push_str(" AND building_name = ?");
        args.push(Value::Text(b.clone()));
    }
    if let Some(s) = &filter.sub_type {
        sql.push_str(" AND sub_type = ?");
        args.push(Value::Text(s.clone()));
    }
    if let Some(m) = filter.move_in {
        sql.push_str(" AND move_in = ?");
        args.push(Value::Text(m.label().to_string()));
    }
    if let Some(s) = filter.status {
        sql.push_str(" AND status = ?");
        args.push(Value::Text(s.label().to_string()));
    }
    if let Some(term) = &filter.search {
        sql.push_str(
            " AND (ulower(building_name) LIKE ? ESCAPE '\\' \
              OR ulower(unit_label) LIKE ? ESCAPE '\\' \
              OR ulower(sub_type) LIKE ? ESCAPE '\\')",
        );
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        for _ in 0..3 {
            args.push(Value::Text(pattern.clone()));
        }
    }

    sql.push_str(" ORDER BY created_at DESC, id DESC");
    (sql, args)
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<Listing> {
    let amenities_json: String = row.get(9)?;
    // Amenities travel as a JSON-encoded column.
    let amenities: Amenities = serde_json::from_str(&amenities_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Listing {
        id: row.get(0)?,
        fields: ListingDraft {
            building_name: row.get(1)?,
            sub_type: row.get(2)?,
            unit_label: row.get(3)?,
            deposit: row.get(4)?,
            monthly_rent: row.get(5)?,
            access_code: row.get(6)?,
            move_in: row.get(7)?,
            status: row.get(8)?,
            amenities,
            notes: row.get(10)?,
            contact: row.get(11)?,
        },
        created_at: row.get(12)?,
        deleted: row.get(13)?,
    })
}

fn amenities_json(amenities: &Amenities) -> Result<String, ServerError> {
    serde_json::to_string(amenities)
        .map_err(|e| ServerError::DbError(format!("encode amenities failed: {e}")))
}

pub fn list_listings(conn: &Connection, filter: &ListingFilter) -> Result<Vec<Listing>, ServerError> {
    let (sql, args) = build_list_query(filter);
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt.query_map(params_from_iter(args.iter()), listing_from_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Fetch a live listing.
pub fn find_listing(conn: &Connection, id: i64) -> Result<Option<Listing>, ServerError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM properties WHERE id = ? AND deleted = 0");
    Ok(conn
        .query_row(&sql, params![id], listing_from_row)
        .optional()?)
}

/// Caller validates the draft. Duplicate live units surface as `Conflict`.
pub fn insert_listing(
    conn: &Connection,
    draft: &ListingDraft,
    now: DateTime<Utc>,
) -> Result<i64, ServerError> {
    conn.execute(
        r#"
        INSERT INTO properties (
            building_name, sub_type, unit_label, deposit, monthly_rent, access_code,
            move_in, status, amenities, notes, contact, created_at, deleted
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0)
        "#,
        params![
            &draft.building_name,
            &draft.sub_type,
            &draft.unit_label,
            draft.deposit,
            draft.monthly_rent,
            &draft.access_code,
            draft.move_in,
            draft.status,
            amenities_json(&draft.amenities)?,
            &draft.notes,
            &draft.contact,
            now,
        ],
    )
    .map_err(|e| unit_conflict(e, draft))?;
    Ok(conn.last_insert_rowid())
}

/// Returns whether a live row was updated.
pub fn update_listing(conn: &Connection, id: i64, draft: &ListingDraft) -> Result<bool, ServerError> {
    let changed = conn
        .execute(
            r#"
            UPDATE properties SET
                building_name = ?1, sub_type = ?2, unit_label = ?3, deposit = ?4,
                monthly_rent = ?5, access_code = ?6, move_in = ?7, status = ?8,
                amenities = ?9, notes = ?10, contact = ?11
            WHERE id = ?12 AND deleted = 0
            "#,
            params![
                &draft.building_name,
                &draft.sub_type,
                &draft.unit_label,
                draft.deposit,
                draft.monthly_rent,
                &draft.access_code,
                draft.move_in,
                draft.status,
                amenities_json(&draft.amenities)?,
                &draft.notes,
                &draft.contact,
                id,
            ],
        )
        .map_err(|e| unit_conflict(e, draft))?;
    Ok(changed == 1)
}

/// Logical delete. Returns whether a live row was flagged.
pub fn soft_delete_listing(conn: &Connection, id: i64) -> Result<bool, ServerError> {
    let changed = conn.execute(
        "UPDATE properties SET deleted = 1 WHERE id = ? AND deleted = 0",
        params![id],
    )?;
    Ok(changed == 1)
}

fn unit_conflict(err: rusqlite::Error, draft: &ListingDraft) -> ServerError {
    match ServerError::from(err) {
        ServerError::Conflict(_) => ServerError::Conflict(format!(
            "a listing for {} {} {} already exists",
            draft.building_name, draft.sub_type, draft.unit_label
        )),
        other => other,
    }
}
