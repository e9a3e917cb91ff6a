//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! `PurchaseStore` and `CustomerIdentityLinker` wrap the persistence ports
//! with the at-least-once delivery rules; the handlers build on them.

pub mod handlers;

mod customer_linker;
mod purchase_store;

pub use customer_linker::CustomerIdentityLinker;
pub use purchase_store::{PurchaseStore, StoreOutcome};

pub use handlers::billing::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CreateCheckoutLinkCommand,
    CreateCheckoutLinkHandler, CreatePortalLinkCommand, CreatePortalLinkHandler,
    CreatePortalLinkResult, ProcessWebhookCommand, ProcessWebhookHandler,
    SetSubscriptionSeatsCommand, SetSubscriptionSeatsHandler, WebhookOutcome,
};
