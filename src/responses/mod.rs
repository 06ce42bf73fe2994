pub mod cors;
pub mod errors;
pub mod json;
pub mod xlsx;

pub use cors::{apply_cors, preflight};
pub use errors::error_to_response;
pub use json::json_response;
pub use xlsx::xlsx_response;

pub use crate::errors::ResultResp;
