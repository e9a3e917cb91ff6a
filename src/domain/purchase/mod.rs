//! Purchase domain - canonical purchases and webhook classification.
//!
//! # Module Organization
//!
//! - `aggregate` - The `Purchase` entity and its construction rules
//! - `status` - Canonical status set and provider synonym folding
//! - `owner` - Organization xor user ownership
//! - `provider` - The closed set of payment platforms
//! - `event` - Provider-neutral classification of verified webhooks
//! - `signature` - HMAC and timestamp checks shared by adapters
//! - `webhook_errors` - Failure taxonomy with HTTP status mapping

mod aggregate;
mod event;
mod owner;
mod provider;
pub mod signature;
mod status;
mod webhook_errors;

pub use aggregate::{
    NewOneTimePurchase, NewSubscriptionPurchase, Purchase, PurchaseType, SubscriptionChange,
};
pub use event::{BillingEvent, CompletedCheckout, SubscriptionSnapshot, SubscriptionUpdate};
pub use owner::{OwnerRef, ORGANIZATION_ID_KEY, USER_ID_KEY};
pub use provider::ProviderKind;
pub use status::PurchaseStatus;
pub use webhook_errors::WebhookError;

#[cfg(test)]
pub(crate) use aggregate::test_support;
