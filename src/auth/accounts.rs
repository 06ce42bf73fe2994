// src/auth/accounts.rs
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::password::{hash_password, verify_password, DEFAULT_PBKDF2_ITERATIONS};
use crate::auth::sessions::{
    create_session, end_session, load_account_from_session, DEFAULT_SESSION_TTL_SECS,
};
use crate::domain::account::Account;
use crate::errors::ServerError;
use crate::gateway::AccountGateway;

pub const MIN_PASSWORD_CHARS: usize = 4;

#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub pbkdf2_iterations: u32,
    /// Session lifetime in seconds.
    pub session_ttl_secs: i64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub token: String,
    pub expires_at: i64,
    pub account: Account,
}

/// Account policy on top of an `AccountGateway`: password rules, hashing,
/// session issue and the self-delete guard.
pub struct AccountService<'a> {
    cfg: &'a AccountConfig,
    accounts: &'a dyn AccountGateway,
}

impl<'a> AccountService<'a> {
    pub fn new(cfg: &'a AccountConfig, accounts: &'a dyn AccountGateway) -> Self {
        Self { cfg, accounts }
    }

    fn check_new_password(password: &str) -> Result<(), ServerError> {
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ServerError::BadRequest(format!(
                "password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }
        Ok(())
    }

    pub fn add_account(
        &self,
        username: &str,
        password: &str,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Account, ServerError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ServerError::BadRequest(
                "username and password required".into(),
            ));
        }
        Self::check_new_password(password)?;

        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let hash = hash_password(password, self.cfg.pbkdf2_iterations);
        let account = self.accounts.insert_account(username, &hash, name, now)?;

        tracing::info!(username = %account.username, "account added");
        Ok(account)
    }

    pub fn login(&self, username: &str, password: &str, now: i64) -> Result<LoginOutcome, ServerError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ServerError::BadRequest(
                "username and password required".into(),
            ));
        }

        let record = self.accounts.find_account(username.trim())?;
        let Some(record) = record.filter(|r| verify_password(password, &r.password_hash)) else {
            tracing::debug!(username = %username.trim(), "login rejected");
            return Err(ServerError::Unauthorized(
                "invalid username or password".into(),
            ));
        };

        let token = create_session(self.accounts, record.account.id, now, self.cfg.session_ttl_secs)?;
        Ok(LoginOutcome {
            token,
            expires_at: now + self.cfg.session_ttl_secs,
            account: record.account,
        })
    }

    pub fn authenticate(&self, raw_token: Option<&str>, now: i64) -> Result<Account, ServerError> {
        let Some(raw_token) = raw_token else {
            return Err(ServerError::Unauthorized("login required".into()));
        };
        load_account_from_session(self.accounts, raw_token, now)?
            .ok_or_else(|| ServerError::Unauthorized("session expired or invalid".into()))
    }

    pub fn logout(&self, raw_token: &str, now: i64) -> Result<(), ServerError> {
        end_session(self.accounts, raw_token, now)
    }

    /// Self-service change of password and/or display name. The current
    /// password must match even when only the name changes.
    pub fn change_credentials(
        &self,
        caller: &Account,
        current_password: &str,
        new_password: Option<&str>,
        name: Option<&str>,
    ) -> Result<Account, ServerError> {
        if current_password.is_empty() {
            return Err(ServerError::BadRequest("current password required".into()));
        }
        let new_password = new_password.filter(|p| !p.is_empty());
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        if let Some(p) = new_password {
            Self::check_new_password(p)?;
        }

        let record = self
            .accounts
            .find_account(&caller.username)?
            .ok_or_else(|| ServerError::Unauthorized("account no longer exists".into()))?;
        if !verify_password(current_password, &record.password_hash) {
            return Err(ServerError::Unauthorized(
                "current password is incorrect".into(),
            ));
        }

        if new_password.is_none() && name.is_none() {
            return Err(ServerError::BadRequest("nothing to change".into()));
        }

        let hash = new_password.map(|p| hash_password(p, self.cfg.pbkdf2_iterations));
        let updated = self
            .accounts
            .update_account(&caller.username, hash.as_deref(), name)?;

        tracing::info!(username = %updated.username, password_changed = hash.is_some(), "account updated");
        Ok(updated)
    }

    pub fn delete_account(&self, caller: &Account, username: &str) -> Result<(), ServerError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ServerError::BadRequest("username required".into()));
        }
        if username == caller.username {
            return Err(ServerError::Forbidden(
                "cannot delete the account you are signed in with".into(),
            ));
        }
        if !self.accounts.delete_account(username)? {
            return Err(ServerError::NotFound(format!("account '{username}' not found")));
        }

        tracing::info!(username = %username, deleted_by = %caller.username, "account deleted");
        Ok(())
    }

    /// Create the first administrator when no account exists yet.
    pub fn bootstrap(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, ServerError> {
        if self.accounts.count_accounts()? > 0 {
            return Ok(None);
        }
        self.add_account(username, password, None, now).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vocabulary::BuildingVocabulary;
    use crate::local::LocalStore;

    fn cfg() -> AccountConfig {
        AccountConfig {
            pbkdf2_iterations: 1_000,
            session_ttl_secs: 3_600,
        }
    }

    fn store() -> LocalStore {
        LocalStore::in_memory(BuildingVocabulary::default())
    }

    #[test]
    fn add_account_validates_and_hashes() {
        let cfg = cfg();
        let store = store();
        let svc = AccountService::new(&cfg, &store);

        assert!(matches!(
            svc.add_account("", "abcd", None, Utc::now()),
            Err(ServerError::BadRequest(_))
        ));
        assert!(matches!(
            svc.add_account("bob", "abc", None, Utc::now()),
            Err(ServerError::BadRequest(_))
        ));

        svc.add_account(" bob ", "abcd", Some("밥"), Utc::now()).unwrap();
        let stored = store.find_account("bob").unwrap().unwrap();
        assert_ne!(stored.password_hash, "abcd");
        assert!(verify_password("abcd", &stored.password_hash));

        assert!(matches!(
            svc.add_account("bob", "abcdef", None, Utc::now()),
            Err(ServerError::Conflict(_))
        ));
    }

    #[test]
    fn login_and_authenticate() {
        let cfg = cfg();
        let store = store();
        let svc = AccountService::new(&cfg, &store);
        svc.add_account("admin", "pass1234", None, Utc::now()).unwrap();

        assert!(matches!(
            svc.login("admin", "wrong", 100),
            Err(ServerError::Unauthorized(_))
        ));
        assert!(matches!(
            svc.login("ghost", "pass1234", 100),
            Err(ServerError::Unauthorized(_))
        ));

        let out = svc.login("admin", "pass1234", 100).unwrap();
        assert_eq!(out.expires_at, 3_700);
        let who = svc.authenticate(Some(&out.token), 200).unwrap();
        assert_eq!(who.username, "admin");

        assert!(svc.authenticate(None, 200).is_err());
        assert!(svc.authenticate(Some(&out.token), 3_700).is_err());

        svc.logout(&out.token, 300).unwrap();
        assert!(svc.authenticate(Some(&out.token), 301).is_err());
    }

    #[test]
    fn change_credentials_requires_current_password() {
        let cfg = cfg();
        let store = store();
        let svc = AccountService::new(&cfg, &store);
        let me = svc.add_account("admin", "pass1234", None, Utc::now()).unwrap();

        assert!(matches!(
            svc.change_credentials(&me, "nope", Some("newpass"), None),
            Err(ServerError::Unauthorized(_))
        ));
        assert!(matches!(
            svc.change_credentials(&me, "pass1234", Some("abc"), None),
            Err(ServerError::BadRequest(_))
        ));
        assert!(matches!(
            svc.change_credentials(&me, "pass1234", None, Some("  ")),
            Err(ServerError::BadRequest(_))
        ));

        let updated = svc
            .change_credentials(&me, "pass1234", Some("newpass"), Some("관리자"))
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("관리자"));
        assert!(svc.login("admin", "pass1234", 0).is_err());
        assert!(svc.login("admin", "newpass", 0).is_ok());
    }

    #[test]
    fn cannot_delete_own_account_and_missing_is_not_found() {
        let cfg = cfg();
        let store = store();
        let svc = AccountService::new(&cfg, &store);
        let me = svc.add_account("admin", "pass1234", None, Utc::now()).unwrap();
        svc.add_account("other", "pass1234", None, Utc::now()).unwrap();

        assert!(matches!(
            svc.delete_account(&me, "admin"),
            Err(ServerError::Forbidden(_))
        ));
        assert!(matches!(
            svc.delete_account(&me, "ghost"),
            Err(ServerError::NotFound(_))
        ));
        svc.delete_account(&me, "other").unwrap();
        assert_eq!(svc.accounts.list_accounts().unwrap().len(), 1);
    }

    #[test]
    fn bootstrap_only_when_empty() {
        let cfg = cfg();
        let store = store();
        let svc = AccountService::new(&cfg, &store);

        assert!(svc.bootstrap("admin", "pass1234", Utc::now()).unwrap().is_some());
        assert!(svc.bootstrap("admin2", "pass1234", Utc::now()).unwrap().is_none());
        assert_eq!(store.count_accounts().unwrap(), 1);
    }
}
