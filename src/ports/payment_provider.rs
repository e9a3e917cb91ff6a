//! Payment provider port for external payment platforms.
//!
//! Defines the contract every platform adapter fulfils: hosted checkout and
//! portal links outbound, signature verification and classification inbound.
//!
//! # Optional capabilities
//!
//! Changing seat counts and cancelling are not available on every platform.
//! They live on separate capability traits ([`SeatManagement`],
//! [`SubscriptionCancellation`]). An adapter advertises support by returning
//! `Some(self)` from the matching accessor on [`PaymentProvider`]. Callers
//! check the accessor instead of attempting the call and inspecting the
//! failure.

use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::purchase::{BillingEvent, OwnerRef, ProviderKind, PurchaseType, WebhookError};

/// Port for payment platform integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Which platform this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// Create a hosted checkout link.
    ///
    /// Returns `None` when the platform answered without a URL.
    async fn create_checkout_link(
        &self,
        request: CheckoutLinkRequest,
    ) -> Result<Option<String>, PaymentError>;

    /// Create a link to the platform's self-service billing portal.
    async fn create_customer_portal_link(
        &self,
        request: PortalLinkRequest,
    ) -> Result<Option<String>, PaymentError>;

    /// Verify a webhook against the exact request bytes and classify it.
    ///
    /// Must not parse the body before the signature has been checked.
    async fn verify_webhook(
        &self,
        request: &WebhookRequest<'_>,
    ) -> Result<BillingEvent, WebhookError>;

    /// Seat management, if the platform supports it.
    fn seat_management(&self) -> Option<&dyn SeatManagement> {
        None
    }

    /// Subscription cancellation, if the platform supports it.
    fn cancellation(&self) -> Option<&dyn SubscriptionCancellation> {
        None
    }
}

/// Capability: change the seat quantity of a subscription.
#[async_trait]
pub trait SeatManagement: Send + Sync {
    async fn set_subscription_seats(
        &self,
        subscription_id: &str,
        seats: u32,
    ) -> Result<(), PaymentError>;
}

/// Capability: cancel a subscription.
#[async_trait]
pub trait SubscriptionCancellation: Send + Sync {
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), PaymentError>;
}

/// Resolves the adapter for a platform.
///
/// Resolution is where missing configuration surfaces: an unconfigured
/// platform fails here, on first use, without affecting the others.
pub trait PaymentProviderResolver: Send + Sync {
    fn resolve(&self, kind: ProviderKind) -> Result<Arc<dyn PaymentProvider>, PaymentError>;
}

/// Raw inbound webhook as received by the HTTP layer.
#[derive(Debug, Clone, Copy)]
pub struct WebhookRequest<'a> {
    pub headers: &'a HeaderMap,
    /// Exact request body bytes.
    pub body: &'a [u8],
}

impl<'a> WebhookRequest<'a> {
    pub fn new(headers: &'a HeaderMap, body: &'a [u8]) -> Self {
        Self { headers, body }
    }

    /// Header value as UTF-8, `None` if absent or not valid text.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Request to create a hosted checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutLinkRequest {
    /// One-time sale or subscription.
    pub purchase_type: PurchaseType,

    /// Provider product/price/variant identifier.
    pub product_id: String,

    /// Where the buyer lands after paying.
    pub redirect_url: String,

    /// Buyer email to prefill (optional).
    pub email: Option<String>,

    /// Buyer name to prefill (optional).
    pub name: Option<String>,

    /// Owner the purchase will be recorded against.
    pub owner: OwnerRef,

    /// Seat quantity for per-seat plans.
    pub seats: Option<u32>,

    /// Existing external customer to attach the checkout to.
    pub customer_id: Option<String>,

    /// Trial length for subscriptions, where supported.
    pub trial_period_days: Option<u32>,
}

/// Request to create a billing portal link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalLinkRequest {
    /// Provider's customer ID.
    pub customer_id: String,

    /// Where the portal should send the customer back to.
    pub redirect_url: Option<String>,
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    /// Create a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    /// A required setting for `provider` is missing.
    pub fn configuration(provider: ProviderKind, setting: &str) -> Self {
        Self::new(
            PaymentErrorCode::Configuration,
            format!("{} is not configured: missing {}", provider, setting),
        )
    }

    /// The provider does not offer `capability`.
    pub fn unsupported(provider: ProviderKind, capability: &str) -> Self {
        Self::new(
            PaymentErrorCode::Unsupported,
            format!("{} does not support {}", provider, capability),
        )
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidRequest, message)
    }

    /// Map a non-success HTTP status from the provider API.
    pub fn from_status(provider: ProviderKind, status: u16, body: &str) -> Self {
        let code = match status {
            401 | 403 => PaymentErrorCode::AuthenticationError,
            404 => PaymentErrorCode::NotFound,
            429 => PaymentErrorCode::RateLimitExceeded,
            _ => PaymentErrorCode::ProviderError,
        };
        Self::new(code, format!("{} API error ({}): {}", provider, status, body))
            .with_provider_code(status.to_string())
    }

    /// Response body could not be decoded.
    pub fn unexpected_response(provider: ProviderKind, err: impl std::fmt::Display) -> Self {
        Self::new(
            PaymentErrorCode::ProviderError,
            format!("Failed to parse {} response: {}", provider, err),
        )
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        let code = match err.code {
            PaymentErrorCode::NotFound => ErrorCode::CustomerNotFound,
            PaymentErrorCode::InvalidRequest => ErrorCode::ValidationFailed,
            PaymentErrorCode::Configuration => ErrorCode::ProviderNotConfigured,
            PaymentErrorCode::Unsupported => ErrorCode::CapabilityUnsupported,
            _ => ErrorCode::ExternalServiceError,
        };

        DomainError::new(code, err.message)
    }
}

impl From<PaymentError> for WebhookError {
    fn from(err: PaymentError) -> Self {
        WebhookError::Configuration(err.message)
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Provider API error.
    ProviderError,

    /// Required key or secret missing.
    Configuration,

    /// Capability not offered by this provider.
    Unsupported,

    /// Caller supplied an unusable request.
    InvalidRequest,

    /// Unknown error.
    Unknown,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::Configuration => "configuration",
            PaymentErrorCode::Unsupported => "unsupported",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
