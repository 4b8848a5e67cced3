use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::StowageError;

pub const INVALID_ITEM_ID: &str = "Invalid itemId";

/// The two error shapes clients see, plus a catch-all for server faults.
///
/// An unknown item is reported as `success: false` with HTTP 200, not as an
/// error status.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    UnknownItem,
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn no_data() -> Self {
        ApiError::bad_request("No data provided")
    }
}

impl From<StowageError> for ApiError {
    fn from(err: StowageError) -> Self {
        match err {
            StowageError::UnknownItem(_) => ApiError::UnknownItem,
            StowageError::Csv(_) | StowageError::OutOfRange(_) => {
                ApiError::BadRequest(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::UnknownItem => (StatusCode::OK, INVALID_ITEM_ID.to_string()),
            ApiError::Internal(message) => {
                tracing::error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}
