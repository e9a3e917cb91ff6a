//! Billing handlers.
//!
//! ## Commands
//! - Processing provider webhooks into canonical purchases
//! - Creating checkout and billing portal links
//! - Changing seats and cancelling subscriptions on the platform

mod cancel_subscription;
mod create_checkout_link;
mod create_portal_link;
mod process_webhook;
mod set_subscription_seats;

#[cfg(test)]
pub(crate) mod test_support;

pub use cancel_subscription::{CancelSubscriptionCommand, CancelSubscriptionHandler};
pub use create_checkout_link::{CreateCheckoutLinkCommand, CreateCheckoutLinkHandler};
pub use create_portal_link::{
    CreatePortalLinkCommand, CreatePortalLinkHandler, CreatePortalLinkResult,
};
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, WebhookOutcome};
pub use set_subscription_seats::{SetSubscriptionSeatsCommand, SetSubscriptionSeatsHandler};
