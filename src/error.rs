//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a numeric code and, for the REST surface, an HTTP status and
//! structured JSON error response. On the realtime channel errors are
//! delivered as `{"type":"error", ...}` frames instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All REST error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "reader device is offline",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category           | HTTP Status                |
/// |-----------|--------------------|----------------------------|
/// | 1000–1999 | Validation / Auth  | 400 / 401 / 404            |
/// | 2000–2999 | Routing / State    | 409 Conflict               |
/// | 3000–3999 | Server / Storage   | 500 Internal Server Error  |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A command required the reader device, but no device is connected.
    #[error("reader device is offline")]
    DeviceOffline,

    /// Tag record with the given identifier was not found.
    #[error("tag not found: {0}")]
    TagNotFound(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Admin token missing or mismatched.
    #[error("unauthorized")]
    Unauthorized,

    /// Admin surface is disabled because no token is configured.
    #[error("admin endpoints are disabled")]
    AdminDisabled,

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Unauthorized => 1002,
            Self::AdminDisabled => 1003,
            Self::DeviceOffline => 2001,
            Self::TagNotFound(_) => 2002,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            // Fails closed: an unconfigured admin surface is indistinguishable
            // from a route that does not exist.
            Self::AdminDisabled => StatusCode::NOT_FOUND,
            Self::DeviceOffline => StatusCode::CONFLICT,
            Self::TagNotFound(_) => StatusCode::NOT_FOUND,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn device_offline_maps_to_conflict() {
        let err = GatewayError::DeviceOffline;
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), 2001);
    }

    #[test]
    fn admin_disabled_fails_closed_as_not_found() {
        let err = GatewayError::AdminDisabled;
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn persistence_error_is_internal() {
        let err = GatewayError::PersistenceError("db down".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("db down"));
    }
}
