//! Local profile: the whole data set lives in one JSON document that is
//! rewritten after every mutation. Single user, no server database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::domain::account::{Account, AccountRecord};
use crate::domain::filter::{filter_listings, ListingFilter};
use crate::domain::listing::{Listing, ListingDraft};
use crate::domain::vocabulary::BuildingVocabulary;
use crate::errors::ServerError;
use crate::gateway::{AccountGateway, ListingGateway};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    account_id: i64,
    token_hash: Vec<u8>,
    created_at: i64,
    expires_at: i64,
    revoked_at: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalState {
    next_listing_id: i64,
    next_account_id: i64,
    /// Oldest first; `list` reverses.
    listings: Vec<Listing>,
    accounts: Vec<AccountRecord>,
    #[serde(default)]
    sessions: Vec<SessionRecord>,
}

#[derive(Debug)]
pub struct LocalStore {
    state: Mutex<LocalState>,
    path: Option<PathBuf>,
    vocabulary: BuildingVocabulary,
}

impl LocalStore {
    /// Nothing is written to disk.
    pub fn in_memory(vocabulary: BuildingVocabulary) -> Self {
        Self {
            state: Mutex::new(LocalState::default()),
            path: None,
            vocabulary,
        }
    }

    /// Load `path` when it exists, otherwise start empty; every mutation
    /// rewrites the file.
    pub fn open(path: impl Into<PathBuf>, vocabulary: BuildingVocabulary) -> Result<Self, ServerError> {
        let path = path.into();
        let state = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| {
                ServerError::DbError(format!("read {} failed: {e}", path.display()))
            })?;
            serde_json::from_str(&raw).map_err(|e| {
                ServerError::DbError(format!("parse {} failed: {e}", path.display()))
            })?
        } else {
            LocalState::default()
        };

        Ok(Self {
            state: Mutex::new(state),
            path: Some(path),
            vocabulary,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, LocalState>, ServerError> {
        self.state.lock().map_err(|_| ServerError::InternalError)
    }

    /// Apply `change` to a copy of the state. The copy replaces the live
    /// state only once it is on disk, so a failed write leaves nothing behind.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut LocalState) -> Result<T, ServerError>,
    ) -> Result<T, ServerError> {
        let mut state = self.lock()?;
        let mut next = state.clone();
        let out = change(&mut next)?;
        self.persist(&next)?;
        *state = next;
        Ok(out)
    }

    fn persist(&self, state: &LocalState) -> Result<(), ServerError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_atomically(path, state)
    }
}

fn write_atomically(path: &Path, state: &LocalState) -> Result<(), ServerError> {
    let json = serde_json::to_vec_pretty(state)
        .map_err(|e| ServerError::DbError(format!("encode local state failed: {e}")))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)
        .map_err(|e| ServerError::DbError(format!("write {} failed: {e}", tmp.display())))?;
    fs::rename(&tmp, path)
        .map_err(|e| ServerError::DbError(format!("replace {} failed: {e}", path.display())))
}

fn not_found(id: i64) -> ServerError {
    ServerError::NotFound(format!("listing {id} not found"))
}

fn unit_taken(state: &LocalState, draft: &ListingDraft, except: Option<i64>) -> Result<(), ServerError> {
    let taken = state
        .listings
        .iter()
        .any(|l| Some(l.id) != except && l.occupies_unit_of(draft));
    if taken {
        return Err(ServerError::Conflict(format!(
            "a listing for {} {} {} already exists",
            draft.building_name, draft.sub_type, draft.unit_label
        )));
    }
    Ok(())
}

fn live_position(state: &LocalState, id: i64) -> Result<usize, ServerError> {
    state
        .listings
        .iter()
        .position(|l| l.id == id && !l.deleted)
        .ok_or_else(|| not_found(id))
}

impl ListingGateway for LocalStore {
    fn create(&self, draft: ListingDraft, now: DateTime<Utc>) -> Result<Listing, ServerError> {
        let draft = draft.normalized();
        draft.validate(&self.vocabulary)?;

        self.mutate(|state| {
            unit_taken(state, &draft, None)?;

            state.next_listing_id += 1;
            let listing = Listing {
                id: state.next_listing_id,
                fields: draft,
                created_at: now,
                deleted: false,
            };
            state.listings.push(listing.clone());
            Ok(listing)
        })
    }

    fn list(&self, filter: &ListingFilter) -> Result<Vec<Listing>, ServerError> {
        let state = self.lock()?;
        let newest_first: Vec<Listing> = state.listings.iter().rev().cloned().collect();
        Ok(filter_listings(&newest_first, filter))
    }

    fn get(&self, id: i64) -> Result<Listing, ServerError> {
        let state = self.lock()?;
        let pos = live_position(&state, id)?;
        Ok(state.listings[pos].clone())
    }

    fn update(&self, id: i64, draft: ListingDraft) -> Result<Listing, ServerError> {
        let draft = draft.normalized();
        draft.validate(&self.vocabulary)?;

        self.mutate(|state| {
            // a missing record is a 404 even when the unit would clash
            let pos = live_position(state, id)?;
            unit_taken(state, &draft, Some(id))?;

            state.listings[pos].fields = draft;
            Ok(state.listings[pos].clone())
        })
    }

    fn delete(&self, id: i64) -> Result<(), ServerError> {
        self.mutate(|state| {
            let pos = live_position(state, id)?;
            state.listings[pos].deleted = true;
            Ok(())
        })
    }
}

impl AccountGateway for LocalStore {
    fn list_accounts(&self) -> Result<Vec<Account>, ServerError> {
        let state = self.lock()?;
        Ok(state.accounts.iter().map(|r| r.account.clone()).collect())
    }

    fn find_account(&self, username: &str) -> Result<Option<AccountRecord>, ServerError> {
        let state = self.lock()?;
        Ok(state
            .accounts
            .iter()
            .find(|r| r.account.username == username)
            .cloned())
    }

    fn count_accounts(&self) -> Result<usize, ServerError> {
        Ok(self.lock()?.accounts.len())
    }

    fn insert_account(
        &self,
        username: &str,
        password_hash: &str,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Account, ServerError> {
        self.mutate(|state| {
            if state.accounts.iter().any(|r| r.account.username == username) {
                return Err(ServerError::Conflict(format!(
                    "username '{username}' already exists"
                )));
            }

            state.next_account_id += 1;
            let account = Account {
                id: state.next_account_id,
                username: username.to_string(),
                name: name.map(str::to_string),
                created_at: now,
            };
            state.accounts.push(AccountRecord {
                account: account.clone(),
                password_hash: password_hash.to_string(),
            });
            Ok(account)
        })
    }

    fn update_account(
        &self,
        username: &str,
        password_hash: Option<&str>,
        name: Option<&str>,
    ) -> Result<Account, ServerError> {
        self.mutate(|state| {
            let record = state
                .accounts
                .iter_mut()
                .find(|r| r.account.username == username)
                .ok_or_else(|| ServerError::NotFound(format!("account '{username}' not found")))?;

            if let Some(hash) = password_hash {
                record.password_hash = hash.to_string();
            }
            if let Some(name) = name {
                record.account.name = Some(name.to_string());
            }
            Ok(record.account.clone())
        })
    }

    fn delete_account(&self, username: &str) -> Result<bool, ServerError> {
        self.mutate(|state| {
            let Some(pos) = state
                .accounts
                .iter()
                .position(|r| r.account.username == username)
            else {
                return Ok(false);
            };

            let removed = state.accounts.remove(pos);
            state
                .sessions
                .retain(|s| s.account_id != removed.account.id);
            Ok(true)
        })
    }

    fn insert_session(
        &self,
        account_id: i64,
        token_hash: &[u8],
        now: i64,
        expires_at: i64,
    ) -> Result<(), ServerError> {
        self.mutate(|state| {
            // dead sessions are dropped as new ones arrive
            state
                .sessions
                .retain(|s| s.expires_at > now && s.revoked_at.is_none());
            state.sessions.push(SessionRecord {
                account_id,
                token_hash: token_hash.to_vec(),
                created_at: now,
                expires_at,
                revoked_at: None,
            });
            Ok(())
        })
    }

    fn find_session(&self, token_hash: &[u8], now: i64) -> Result<Option<Account>, ServerError> {
        let state = self.lock()?;
        let Some(session) = state.sessions.iter().find(|s| {
            s.token_hash == token_hash && s.expires_at > now && s.revoked_at.is_none()
        }) else {
            return Ok(None);
        };

        Ok(state
            .accounts
            .iter()
            .find(|r| r.account.id == session.account_id)
            .map(|r| r.account.clone()))
    }

    fn revoke_session(&self, token_hash: &[u8], now: i64) -> Result<(), ServerError> {
        self.mutate(|state| {
            for s in state
                .sessions
                .iter_mut()
                .filter(|s| s.token_hash == token_hash && s.revoked_at.is_none())
            {
                s.revoked_at = Some(now);
            }
            Ok(())
        })
    }
}
