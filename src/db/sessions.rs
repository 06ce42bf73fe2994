// src/db/sessions.rs
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::account::Account;
use crate::errors::ServerError;

pub fn insert_session(
    conn: &Connection,
    admin_id: i64,
    token_hash: &[u8],
    now: i64,
    expires_at: i64,
) -> Result<(), ServerError> {
    conn.execute(
        "delete from sessions where expires_at <= ? or revoked_at is not null",
        params![now],
    )
    .map_err(|e| ServerError::DbError(format!("prune sessions failed: {e}")))?;

    conn.execute(
        r#"
        insert into sessions (admin_id, token_hash, created_at, expires_at)
        values (?, ?, ?, ?)
        "#,
        params![admin_id, token_hash, now, expires_at],
    )
    .map_err(|e| ServerError::DbError(format!("create session failed: {e}")))?;
    Ok(())
}

pub fn find_session_account(
    conn: &Connection,
    token_hash: &[u8],
    now: i64,
) -> Result<Option<Account>, ServerError> {
    conn.query_row(
        r#"
        select a.id, a.username, a.name, a.created_at
        from sessions s
        join admins a on a.id = s.admin_id
        where s.token_hash = ?
          and s.expires_at > ?
          and s.revoked_at is null
        "#,
        params![token_hash, now],
        |row| {
            Ok(Account {
                id: row.get(0)?,
                username: row.get(1)?,
                name: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("session lookup failed: {e}")))
}

pub fn revoke_session(conn: &Connection, token_hash: &[u8], now: i64) -> Result<(), ServerError> {
    conn.execute(
        "update sessions set revoked_at = ? where token_hash = ? and revoked_at is null",
        params![now, token_hash],
    )
    .map_err(|e| ServerError::DbError(format!("revoke session failed: {e}")))?;
    Ok(())
}
