use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

/// Uniform error payload. Server-side failures get a canned message so
/// internal error detail never leaks to the client.
pub fn error_response(status: StatusCode, err: &impl std::fmt::Display) -> Response {
    let message = if status.is_server_error() {
        "Internal server error".to_string()
    } else {
        err.to_string()
    };

    let body = Json(ErrorResponse {
        code: status.as_u16(),
        message,
    });

    (status, body).into_response()
}
