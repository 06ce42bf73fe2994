// src/auth/sessions.rs
use crate::auth::token::{issue_token, token_hash};
use crate::domain::account::Account;
use crate::errors::ServerError;
use crate::gateway::AccountGateway;

pub const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7; // 7 days

/// Issue a session for `account_id`. Only the token hash is stored.
pub fn create_session(
    accounts: &dyn AccountGateway,
    account_id: i64,
    now: i64,
    ttl_secs: i64,
) -> Result<String, ServerError> {
    let issued = issue_token();
    accounts.insert_session(account_id, &issued.hash, now, now + ttl_secs)?;
    Ok(issued.raw)
}

pub fn load_account_from_session(
    accounts: &dyn AccountGateway,
    raw_token: &str,
    now: i64,
) -> Result<Option<Account>, ServerError> {
    let raw_token = raw_token.trim();
    if raw_token.is_empty() {
        return Ok(None);
    }
    accounts.find_session(&token_hash(raw_token), now)
}

pub fn end_session(accounts: &dyn AccountGateway, raw_token: &str, now: i64) -> Result<(), ServerError> {
    accounts.revoke_session(&token_hash(raw_token.trim()), now)
}
