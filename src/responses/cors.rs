// responses/cors.rs
use astra::{Body, Response, ResponseBuilder};
use http::HeaderValue;

use crate::errors::{ResultResp, ServerError};

pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Stamp the allowed origin on any response, errors and downloads included.
pub fn apply_cors(mut resp: Response, origin: &str) -> Response {
    let value = HeaderValue::from_str(origin).unwrap_or(HeaderValue::from_static("*"));
    resp.headers_mut()
        .insert("Access-Control-Allow-Origin", value);
    resp
}

/// 204 answer to an `OPTIONS` request for a resource serving `methods`.
pub fn preflight(methods: &[&str], origin: &str) -> ResultResp {
    let mut allow = methods.join(", ");
    allow.push_str(", OPTIONS");

    ResponseBuilder::new()
        .status(204)
        .header("Access-Control-Allow-Origin", origin)
        .header("Access-Control-Allow-Methods", allow)
        .header("Access-Control-Allow-Headers", ALLOW_HEADERS)
        .header("Access-Control-Max-Age", "86400")
        .body(Body::empty())
        .map_err(|_| ServerError::InternalError)
}
