//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Payment Ports
//!
//! - `PaymentProvider` - One payment platform (checkout, portal, webhooks)
//! - `SeatManagement` / `SubscriptionCancellation` - Optional capabilities
//! - `PaymentProviderResolver` - Lazily resolves the adapter for a platform
//!
//! ## Persistence Ports
//!
//! - `PurchaseRepository` - Canonical purchase storage
//! - `CustomerDirectory` - Owner to external customer mapping

mod customer_directory;
mod payment_provider;
mod purchase_repository;

pub use customer_directory::{CustomerDirectory, CustomerLink};
pub use payment_provider::{
    CheckoutLinkRequest, PaymentError, PaymentErrorCode, PaymentProvider,
    PaymentProviderResolver, PortalLinkRequest, SeatManagement, SubscriptionCancellation,
    WebhookRequest,
};
pub use purchase_repository::{PurchaseRepository, SaveResult};
