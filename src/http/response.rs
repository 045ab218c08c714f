//! Response helpers.
//!
//! Every error the gateway renders itself uses the same JSON envelope:
//! `{"status": "error", "error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// JSON error envelope with `status`.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({
        "status": "error",
        "error": message.into(),
    });
    (status, Json(body)).into_response()
}

/// 404 for requests no route accepted.
pub fn route_not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "Route not found")
}
