//! Payment platform adapters.
//!
//! One adapter per [`ProviderKind`], each implementing [`PaymentProvider`]
//! and whichever capability traits the platform supports. The
//! [`ProviderRegistry`] builds them lazily from configuration.

mod chargebee;
mod common;
mod creem;
mod lemonsqueezy;
mod polar;
mod registry;
mod stripe;

#[cfg(test)]
pub(crate) mod test_server;

pub use chargebee::{ChargebeeAdapter, ChargebeeConfig};
pub use creem::{CreemAdapter, CreemConfig};
pub use lemonsqueezy::{LemonSqueezyAdapter, LemonSqueezyConfig};
pub use polar::{PolarAdapter, PolarConfig};
pub use registry::ProviderRegistry;
pub use stripe::{SignatureHeader, StripeAdapter, StripeConfig};

use async_trait::async_trait;

use crate::domain::purchase::{BillingEvent, ProviderKind, WebhookError};
use crate::ports::{
    CheckoutLinkRequest, PaymentError, PaymentProvider, PortalLinkRequest, SeatManagement,
    SubscriptionCancellation, WebhookRequest,
};

/// Closed set of platform adapters.
pub enum ProviderAdapter {
    Stripe(StripeAdapter),
    LemonSqueezy(LemonSqueezyAdapter),
    Polar(PolarAdapter),
    Creem(CreemAdapter),
    Chargebee(ChargebeeAdapter),
}

impl ProviderAdapter {
    fn inner(&self) -> &dyn PaymentProvider {
        match self {
            ProviderAdapter::Stripe(adapter) => adapter,
            ProviderAdapter::LemonSqueezy(adapter) => adapter,
            ProviderAdapter::Polar(adapter) => adapter,
            ProviderAdapter::Creem(adapter) => adapter,
            ProviderAdapter::Chargebee(adapter) => adapter,
        }
    }
}

#[async_trait]
impl PaymentProvider for ProviderAdapter {
    fn kind(&self) -> ProviderKind {
        self.inner().kind()
    }

    async fn create_checkout_link(
        &self,
        request: CheckoutLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        self.inner().create_checkout_link(request).await
    }

    async fn create_customer_portal_link(
        &self,
        request: PortalLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        self.inner().create_customer_portal_link(request).await
    }

    async fn verify_webhook(&self, request: &WebhookRequest<'_>) -> Result<BillingEvent, WebhookError> {
        self.inner().verify_webhook(request).await
    }

    fn seat_management(&self) -> Option<&dyn SeatManagement> {
        self.inner().seat_management()
    }

    fn cancellation(&self) -> Option<&dyn SubscriptionCancellation> {
        self.inner().cancellation()
    }
}
