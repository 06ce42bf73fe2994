// errors.rs
use astra::Response;
use thiserror::Error;

use crate::import::RowError;

/// Errors originating from either the server logic
/// (routing, validation, missing resources) or downstream layers (DB, XLSX).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Import rows that failed validation, in sheet order.
    #[error("{} row(s) failed validation", .0.len())]
    InvalidRows(Vec<RowError>),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Database Error: {0}")]
    DbError(String),

    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Spreadsheet Error: {0}")]
    XlsxError(String),

    #[error("Internal Server Error")]
    InternalError,
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;

impl ServerError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::BadRequest(_) | ServerError::InvalidRows(_) => 400,
            ServerError::Unauthorized(_) => 401,
            ServerError::Forbidden(_) => 403,
            ServerError::NotFound(_) => 404,
            ServerError::Conflict(_) => 409,
            ServerError::PayloadTooLarge(_) => 413,
            ServerError::DbError(_)
            | ServerError::ConfigError(_)
            | ServerError::XlsxError(_)
            | ServerError::InternalError => 500,
        }
    }
}

impl From<rusqlite::Error> for ServerError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::ConstraintViolation
                    && msg.as_deref().is_some_and(|m| m.contains("UNIQUE")) =>
            {
                ServerError::Conflict(msg.unwrap_or_default())
            }
            other => ServerError::DbError(other.to_string()),
        }
    }
}
