use astra::{Body, Response, ResponseBuilder};
use serde_json::json;

use crate::errors::ServerError;

/// Convert a ServerError into a JSON `{ "error": ... }` response.
/// Row validation failures also carry the full `errors` list.
pub fn error_to_response(err: ServerError) -> Response {
    let status = err.status_code();
    if status >= 500 {
        tracing::error!(status, error = %err, "request failed");
    } else {
        tracing::debug!(status, error = %err, "request rejected");
    }

    let body = match &err {
        ServerError::InvalidRows(rows) => json!({ "error": err.to_string(), "errors": rows }),
        // Internal details stay in the log.
        ServerError::DbError(_) | ServerError::ConfigError(_) | ServerError::XlsxError(_) => {
            json!({ "error": "Internal Server Error" })
        }
        _ => json!({ "error": err.to_string() }),
    };

    json_error_response(status, &body.to_string())
}

/// Build a JSON error response from an already encoded body.
pub fn json_error_response(status: u16, body: &str) -> Response {
    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| {
            let mut resp = Response::new(Body::from(r#"{"error":"Internal Server Error"}"#));
            *resp.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            resp
        })
}
