//! Webhook error types.
//!
//! Defines every way a webhook delivery can fail before or while being
//! applied, with HTTP status code mapping and retryability semantics.
//! Unrecognised event types are not errors; they classify as
//! [`BillingEvent::Ignored`](super::BillingEvent::Ignored).

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ValidationError};

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature header (or credential) absent or unparseable.
    #[error("Missing or malformed signature: {0}")]
    MissingSignature(&'static str),

    /// Signature present but does not match the body.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature timestamp could not be parsed.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Signature timestamp outside the accepted window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Verified body could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from the webhook payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Owner metadata needed to create a purchase is missing or invalid.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// Provider is not configured (missing secret or key).
    #[error("Provider not configured: {0}")]
    Configuration(String),

    /// Persistence failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WebhookError {
    /// Returns true if the provider should redeliver this webhook.
    ///
    /// Verification and payload errors will fail identically on every
    /// attempt. Configuration and storage errors may clear up.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Configuration(_) | WebhookError::Storage(_))
    }

    /// Returns true for failures of the signature check itself.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingSignature(_)
                | WebhookError::InvalidSignature
                | WebhookError::InvalidTimestamp
                | WebhookError::TimestampOutOfRange
        )
    }

    /// HTTP status returned to the provider.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature | WebhookError::TimestampOutOfRange => {
                StatusCode::FORBIDDEN
            }

            WebhookError::MissingSignature(_)
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingField(_)
            | WebhookError::MissingMetadata(_) => StatusCode::BAD_REQUEST,

            WebhookError::Configuration(_) | WebhookError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::ParseError(err.to_string())
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Storage(err.to_string())
    }
}

impl From<ValidationError> for WebhookError {
    fn from(err: ValidationError) -> Self {
        WebhookError::ParseError(err.to_string())
    }
}
