// responses/json.rs
use astra::{Body, ResponseBuilder};
use serde::Serialize;

use crate::errors::{ResultResp, ServerError};

/// Serialize `value` as the JSON body of a `status` response.
pub fn json_response<T: Serialize + ?Sized>(status: u16, value: &T) -> ResultResp {
    let body = serde_json::to_vec(value).map_err(|e| {
        tracing::error!(error = %e, "response serialization failed");
        ServerError::InternalError
    })?;

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body))
        .map_err(|_| ServerError::InternalError)
}
