use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public view of an administrator account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Stored account including the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    #[serde(flatten)]
    pub account: Account,
    pub password_hash: String,
}
