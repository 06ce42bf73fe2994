//! Runtime configuration from `LISTING_DESK_*` environment variables.
//! A malformed value falls back to its default; only an unknown storage
//! profile is fatal.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::auth::accounts::AccountConfig;
use crate::auth::password::DEFAULT_PBKDF2_ITERATIONS;
use crate::auth::sessions::DEFAULT_SESSION_TTL_SECS;
use crate::errors::ServerError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_DB_PATH: &str = "listing_desk.sqlite3";
pub const DEFAULT_LOCAL_FILE: &str = "listing_desk.json";
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProfile {
    Sqlite(PathBuf),
    /// Single JSON document, no database server.
    Local(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub workers: usize,
    pub storage: StorageProfile,
    pub vocabulary_path: Option<PathBuf>,
    pub cors_origin: String,
    pub max_body_bytes: usize,
    pub accounts: AccountConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            workers: DEFAULT_WORKERS,
            storage: StorageProfile::Sqlite(PathBuf::from(DEFAULT_DB_PATH)),
            vocabulary_path: None,
            cors_origin: "*".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            accounts: AccountConfig::default(),
            bootstrap_admin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let parsed = |name: &str| var(name).and_then(|v| v.parse::<u64>().ok());

        let addr = var("LISTING_DESK_ADDR")
            .and_then(|v| v.parse::<SocketAddr>().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)));

        let workers = parsed("LISTING_DESK_WORKERS")
            .filter(|n| *n > 0)
            .map_or(DEFAULT_WORKERS, |n| n as usize);

        let storage = match var("LISTING_DESK_STORAGE").as_deref() {
            None | Some("sqlite") => StorageProfile::Sqlite(PathBuf::from(
                var("LISTING_DESK_DB").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            )),
            Some("local") => StorageProfile::Local(PathBuf::from(
                var("LISTING_DESK_LOCAL_FILE").unwrap_or_else(|| DEFAULT_LOCAL_FILE.to_string()),
            )),
            Some(other) => {
                return Err(ServerError::ConfigError(format!(
                    "unknown LISTING_DESK_STORAGE '{other}' (expected sqlite or local)"
                )))
            }
        };

        let session_ttl_secs = parsed("LISTING_DESK_SESSION_TTL_SECS")
            .filter(|n| *n > 0 && *n <= i64::MAX as u64)
            .map_or(DEFAULT_SESSION_TTL_SECS, |n| n as i64);
        let pbkdf2_iterations = parsed("LISTING_DESK_PBKDF2_ITERATIONS")
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PBKDF2_ITERATIONS);
        let max_body_bytes = parsed("LISTING_DESK_MAX_BODY_BYTES")
            .filter(|n| *n > 0)
            .map_or(DEFAULT_MAX_BODY_BYTES, |n| n as usize);

        let bootstrap_admin = match (var("LISTING_DESK_ADMIN_USER"), lookup("LISTING_DESK_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) if !password.is_empty() => {
                Some(BootstrapAdmin { username, password })
            }
            _ => None,
        };

        Ok(Self {
            addr,
            workers,
            storage,
            vocabulary_path: var("LISTING_DESK_VOCABULARY").map(PathBuf::from),
            cors_origin: var("LISTING_DESK_CORS_ORIGIN").unwrap_or_else(|| "*".to_string()),
            max_body_bytes,
            accounts: AccountConfig {
                pbkdf2_iterations,
                session_ttl_secs,
            },
            bootstrap_admin,
        })
    }
}
