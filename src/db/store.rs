use chrono::{DateTime, Utc};

use crate::db::connection::Database;
use crate::db::{accounts, listings, sessions};
use crate::domain::account::{Account, AccountRecord};
use crate::domain::filter::ListingFilter;
use crate::domain::listing::{Listing, ListingDraft};
use crate::domain::vocabulary::BuildingVocabulary;
use crate::errors::ServerError;
use crate::gateway::{AccountGateway, ListingGateway};

/// Server-backed profile: both gateways over one SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
    vocabulary: BuildingVocabulary,
}

impl SqliteStore {
    pub fn new(db: Database, vocabulary: BuildingVocabulary) -> Self {
        Self { db, vocabulary }
    }
}

fn not_found(id: i64) -> ServerError {
    ServerError::NotFound(format!("listing {id} not found"))
}

impl ListingGateway for SqliteStore {
    fn create(&self, draft: ListingDraft, now: DateTime<Utc>) -> Result<Listing, ServerError> {
        let draft = draft.normalized();
        draft.validate(&self.vocabulary)?;

        self.db.with_conn(|conn| {
            let id = listings::insert_listing(conn, &draft, now)?;
            listings::find_listing(conn, id)?.ok_or(ServerError::InternalError)
        })
    }

    fn list(&self, filter: &ListingFilter) -> Result<Vec<Listing>, ServerError> {
        self.db.with_conn(|conn| listings::list_listings(conn, filter))
    }

    fn get(&self, id: i64) -> Result<Listing, ServerError> {
        self.db
            .with_conn(|conn| listings::find_listing(conn, id))?
            .ok_or_else(|| not_found(id))
    }

    fn update(&self, id: i64, draft: ListingDraft) -> Result<Listing, ServerError> {
        let draft = draft.normalized();
        draft.validate(&self.vocabulary)?;

        self.db.with_conn(|conn| {
            if !listings::update_listing(conn, id, &draft)? {
                return Err(not_found(id));
            }
            listings::find_listing(conn, id)?.ok_or_else(|| not_found(id))
        })
    }

    fn delete(&self, id: i64) -> Result<(), ServerError> {
        if self.db.with_conn(|conn| listings::soft_delete_listing(conn, id))? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }
}

impl AccountGateway for SqliteStore {
    fn list_accounts(&self) -> Result<Vec<Account>, ServerError> {
        self.db.with_conn(|conn| accounts::list_accounts(conn))
    }

    fn find_account(&self, username: &str) -> Result<Option<AccountRecord>, ServerError> {
        self.db.with_conn(|conn| accounts::find_account(conn, username))
    }

    fn count_accounts(&self) -> Result<usize, ServerError> {
        self.db.with_conn(|conn| accounts::count_accounts(conn))
    }

    fn insert_account(
        &self,
        username: &str,
        password_hash: &str,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Account, ServerError> {
        self.db
            .with_conn(|conn| accounts::insert_account(conn, username, password_hash, name, now))
    }

    fn update_account(
        &self,
        username: &str,
        password_hash: Option<&str>,
        name: Option<&str>,
    ) -> Result<Account, ServerError> {
        self.db
            .with_conn(|conn| accounts::update_account(conn, username, password_hash, name))
    }

    fn delete_account(&self, username: &str) -> Result<bool, ServerError> {
        self.db.with_conn(|conn| accounts::delete_account(conn, username))
    }

    fn insert_session(
        &self,
        account_id: i64,
        token_hash: &[u8],
        now: i64,
        expires_at: i64,
    ) -> Result<(), ServerError> {
        self.db
            .with_conn(|conn| sessions::insert_session(conn, account_id, token_hash, now, expires_at))
    }

    fn find_session(&self, token_hash: &[u8], now: i64) -> Result<Option<Account>, ServerError> {
        self.db
            .with_conn(|conn| sessions::find_session_account(conn, token_hash, now))
    }

    fn revoke_session(&self, token_hash: &[u8], now: i64) -> Result<(), ServerError> {
        self.db
            .with_conn(|conn| sessions::revoke_session(conn, token_hash, now))
    }
}
