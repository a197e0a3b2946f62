//! DCEvent API — error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dcevent_core::error::{ApiError, TransportError};
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The upstream HTTP client could not be created.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `ApiError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiHttpError(pub ApiError);

impl From<ApiError> for ApiHttpError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl ApiHttpError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            ApiError::NoSuchContest(_) => (StatusCode::NOT_FOUND, "no_such_contest"),
            ApiError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, "invalid_identifier"),
            ApiError::ContestsUnavailable { .. }
            | ApiError::ContestSignupsUnavailable { .. }
            | ApiError::EventSignupsUnavailable { .. } => {
                (StatusCode::BAD_GATEWAY, "upstream_unavailable")
            }
            ApiError::MalformedResponse { .. } => (StatusCode::BAD_GATEWAY, "upstream_malformed"),
        }
    }
}

impl IntoResponse for ApiHttpError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
