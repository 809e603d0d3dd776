//! HTTP error responses
//!
//! Every error body is a JSON object with an `error` field; `details` is
//! added where the underlying cause is useful to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// API errors
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or incomplete request (400)
    BadRequest(String),
    /// Store or server-side failure (500)
    Internal {
        error: String,
        details: Option<String>,
    },
    /// Third-party upstream failure (502)
    BadGateway(String),
}

impl ApiError {
    pub fn internal(error: impl Into<String>) -> Self {
        ApiError::Internal {
            error: error.into(),
            details: None,
        }
    }

    pub fn internal_with_details(error: impl Into<String>, details: impl ToString) -> Self {
        ApiError::Internal {
            error: error.into(),
            details: Some(details.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::Internal {
                error,
                details: Some(details),
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": error, "details": details }),
            ),
            ApiError::Internal {
                error,
                details: None,
            } => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": error })),
            ApiError::BadGateway(message) => (StatusCode::BAD_GATEWAY, json!({ "error": message })),
        };

        (status, Json(body)).into_response()
    }
}
