//! HTTP response and error types for the key-value API

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::kvstore::{StoreError, StoreErrorCode};
use crate::observability::Logger;

/// JSON error body: one object with a message and a stable code.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Response body for key listings.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub keys: Vec<String>,
    pub count: usize,
}

/// Response body for the liveness probe.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// API-level failures mapped onto HTTP statuses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or wrong bearer token
    Unauthorized,
    /// Malformed type, key, or value at the HTTP boundary
    InvalidArgument(String),
    /// No record under the requested `(type, key)`
    NotFound,
    /// Value payload exceeds the configured maximum
    PayloadTooLarge,
    /// Storage failure; details stay in the process log
    Internal,
}

impl ApiError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ApiError::InvalidArgument(message.into())
    }

    /// Maps a store failure, logging anything that is not the caller's
    /// fault.
    pub fn from_store(err: StoreError) -> Self {
        match err.code() {
            StoreErrorCode::InvalidArgument => {
                ApiError::InvalidArgument(err.message().to_string())
            }
            _ => {
                Logger::error("STORE_OPERATION_FAILED", &[("error", &err.to_string())]);
                ApiError::Internal
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Unauthorized => "missing or invalid bearer token".to_string(),
            ApiError::InvalidArgument(message) => message.clone(),
            ApiError::NotFound => "record not found".to_string(),
            ApiError::PayloadTooLarge => "value exceeds the configured maximum size".to_string(),
            ApiError::Internal => "internal storage error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.message(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::invalid_argument("bad").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_store_argument_maps_to_bad_request() {
        let err = ApiError::from_store(StoreError::invalid_argument("key must be nonempty"));
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }
}
