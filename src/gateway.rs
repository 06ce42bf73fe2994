// src/gateway.rs
use chrono::{DateTime, Utc};

use crate::domain::account::{Account, AccountRecord};
use crate::domain::filter::ListingFilter;
use crate::domain::listing::{Listing, ListingDraft};
use crate::errors::ServerError;

/// Listing storage contract shared by the SQLite and local-file profiles.
///
/// Deletion is logical: `delete` sets the flag, and a deleted listing is
/// not found by `get`, `update` or `delete`. `create` and `update` enforce
/// the building vocabulary.
pub trait ListingGateway: Send + Sync {
    fn create(&self, draft: ListingDraft, now: DateTime<Utc>) -> Result<Listing, ServerError>;

    /// Newest first.
    fn list(&self, filter: &ListingFilter) -> Result<Vec<Listing>, ServerError>;

    fn get(&self, id: i64) -> Result<Listing, ServerError>;

    fn update(&self, id: i64, draft: ListingDraft) -> Result<Listing, ServerError>;

    fn delete(&self, id: i64) -> Result<(), ServerError>;
}

/// Administrator accounts and their sessions. Policy (hashing, length
/// rules, self-delete) lives in `auth::accounts`.
pub trait AccountGateway: Send + Sync {
    fn list_accounts(&self) -> Result<Vec<Account>, ServerError>;

    fn find_account(&self, username: &str) -> Result<Option<AccountRecord>, ServerError>;

    fn count_accounts(&self) -> Result<usize, ServerError>;

    /// Conflict when the username is taken.
    fn insert_account(
        &self,
        username: &str,
        password_hash: &str,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Account, ServerError>;

    /// Only the provided fields change.
    fn update_account(
        &self,
        username: &str,
        password_hash: Option<&str>,
        name: Option<&str>,
    ) -> Result<Account, ServerError>;

    /// Removes the account and its sessions. `false` when it did not exist.
    fn delete_account(&self, username: &str) -> Result<bool, ServerError>;

    fn insert_session(
        &self,
        account_id: i64,
        token_hash: &[u8],
        now: i64,
        expires_at: i64,
    ) -> Result<(), ServerError>;

    /// Account owning a live (unexpired, unrevoked) session.
    fn find_session(&self, token_hash: &[u8], now: i64) -> Result<Option<Account>, ServerError>;

    fn revoke_session(&self, token_hash: &[u8], now: i64) -> Result<(), ServerError>;
}
