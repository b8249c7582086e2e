//! Application error types.
//!
//! `AppError` is what HTTP handlers return. `NotifyError` and `LookupError` never reach a
//! client: the tracker logs them and drops the event.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Serialization(e) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid payload: {}", e),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Why a presence notification was dropped.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("http {status}: {body}")]
    Status { status: u16, body: String },
}

/// Why a privilege lookup failed. Always treated as "not tracked".
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("http {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode: {0}")]
    Decode(reqwest::Error),

    #[error("lookup failed: {0}")]
    Other(String),
}
