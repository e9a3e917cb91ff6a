//! API error responses for the JSON endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Error body returned by the billing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(DomainError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.code {
            ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,
            ErrorCode::PurchaseNotFound | ErrorCode::CustomerNotFound => StatusCode::NOT_FOUND,
            ErrorCode::PurchaseExists => StatusCode::CONFLICT,
            ErrorCode::CapabilityUnsupported => StatusCode::NOT_IMPLEMENTED,
            ErrorCode::ExternalServiceError => StatusCode::BAD_GATEWAY,
            ErrorCode::ProviderNotConfigured
            | ErrorCode::DatabaseError
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = %self.0.code, error = %self.0.message, "Billing request failed");
        }
        let body = ErrorResponse::new(self.0.code.to_string(), self.0.message);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_for(code: ErrorCode) -> StatusCode {
        ApiError(DomainError::new(code, "x")).into_response().status()
    }

    #[test]
    fn maps_error_codes_to_statuses() {
        assert_eq!(status_for(ErrorCode::ValidationFailed), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::CustomerNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorCode::PurchaseNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorCode::CapabilityUnsupported), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(status_for(ErrorCode::ExternalServiceError), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(ErrorCode::ProviderNotConfigured),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_error_converts_to_bad_request() {
        let err = ApiError::from(ValidationError::empty_field("product_id"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
