// src/db/accounts.rs
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::account::{Account, AccountRecord};
use crate::errors::ServerError;

fn account_from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        username: r.get(1)?,
        name: r.get(2)?,
        created_at: r.get(3)?,
    })
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<Account>, ServerError> {
    let mut stmt = conn
        .prepare("select id, username, name, created_at from admins order by id")
        .map_err(|e| ServerError::DbError(format!("prepare list accounts failed: {e}")))?;

    let rows = stmt
        .query_map([], account_from_row)
        .map_err(|e| ServerError::DbError(format!("list accounts failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

pub fn count_accounts(conn: &Connection) -> Result<usize, ServerError> {
    let n: i64 = conn
        .query_row("select count(*) from admins", [], |r| r.get(0))
        .map_err(|e| ServerError::DbError(format!("count accounts failed: {e}")))?;
    Ok(usize::try_from(n).unwrap_or(0))
}

pub fn find_account(conn: &Connection, username: &str) -> Result<Option<AccountRecord>, ServerError> {
    conn.query_row(
        "select id, username, name, created_at, password_hash from admins where username = ?",
        params![username],
        |r| {
            Ok(AccountRecord {
                account: account_from_row(r)?,
                password_hash: r.get(4)?,
            })
        },
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select account failed: {e}")))
}

pub fn insert_account(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    name: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Account, ServerError> {
    conn.execute(
        "insert into admins (username, password_hash, name, created_at) values (?, ?, ?, ?)",
        params![username, password_hash, name, now],
    )
    .map_err(|e| match ServerError::from(e) {
        ServerError::Conflict(_) => ServerError::Conflict(format!("username '{username}' already exists")),
        other => other,
    })?;

    Ok(Account {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        name: name.map(str::to_string),
        created_at: now,
    })
}

pub fn update_account(
    conn: &Connection,
    username: &str,
    password_hash: Option<&str>,
    name: Option<&str>,
) -> Result<Account, ServerError> {
    let changed = conn
        .execute(
            "update admins set
                password_hash = coalesce(?, password_hash),
                name = coalesce(?, name)
             where username = ?",
            params![password_hash, name, username],
        )
        .map_err(|e| ServerError::DbError(format!("update account failed: {e}")))?;

    if changed == 0 {
        return Err(ServerError::NotFound(format!("account '{username}' not found")));
    }

    find_account(conn, username)?
        .map(|r| r.account)
        .ok_or_else(|| ServerError::NotFound(format!("account '{username}' not found")))
}

/// Deletes the account and its sessions in one transaction.
pub fn delete_account(conn: &mut Connection, username: &str) -> Result<bool, ServerError> {
    let tx = conn
        .transaction()
        .map_err(|e| ServerError::DbError(format!("begin tx failed: {e}")))?;

    tx.execute(
        "delete from sessions where admin_id in (select id from admins where username = ?)",
        params![username],
    )
    .map_err(|e| ServerError::DbError(format!("delete sessions failed: {e}")))?;

    let deleted = tx
        .execute("delete from admins where username = ?", params![username])
        .map_err(|e| ServerError::DbError(format!("delete account failed: {e}")))?;

    tx.commit()
        .map_err(|e| ServerError::DbError(format!("commit tx failed: {e}")))?;

    Ok(deleted == 1)
}
