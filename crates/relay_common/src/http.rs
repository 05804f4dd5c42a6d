// --- File: crates/relay_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::envelope::ApiResult;
use crate::error::{HttpStatusCode, RelayError};

// Include the client module
pub mod client;

/// Converts a dispatch result into the HTTP answer: success and
/// wrapper-originated failures are 200 envelopes, local validation is 400,
/// configuration problems are 500. This is the single envelope boundary.
pub fn respond<T: Serialize>(result: Result<T, RelayError>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResult::ok(data))).into_response(),
        Err(err) => error_response(err),
    }
}

/// The failure half of [`respond`], for handlers that build their success
/// envelope by hand.
pub fn error_response(err: RelayError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResult::<serde_json::Value>::err(err.to_string())),
    )
        .into_response()
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        error_response(self)
    }
}
