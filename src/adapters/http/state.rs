//! Shared application state for the HTTP adapters.

use std::sync::Arc;

use crate::application::{
    CancelSubscriptionHandler, CreateCheckoutLinkHandler, CreatePortalLinkHandler,
    CustomerIdentityLinker, ProcessWebhookHandler, PurchaseStore, SetSubscriptionSeatsHandler,
};
use crate::ports::{CustomerDirectory, PaymentProviderResolver, PurchaseRepository};

/// Dependencies shared by every request.
///
/// Cloned per request; every field is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub providers: Arc<dyn PaymentProviderResolver>,
    pub purchases: Arc<dyn PurchaseRepository>,
    pub customers: Arc<dyn CustomerDirectory>,
}

impl AppState {
    pub fn new(
        providers: Arc<dyn PaymentProviderResolver>,
        purchases: Arc<dyn PurchaseRepository>,
        customers: Arc<dyn CustomerDirectory>,
    ) -> Self {
        Self {
            providers,
            purchases,
            customers,
        }
    }

    fn store(&self) -> PurchaseStore {
        PurchaseStore::new(self.purchases.clone())
    }

    fn linker(&self) -> CustomerIdentityLinker {
        CustomerIdentityLinker::new(self.customers.clone())
    }

    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(self.providers.clone(), self.store(), self.linker())
    }

    pub fn checkout_link_handler(&self) -> CreateCheckoutLinkHandler {
        CreateCheckoutLinkHandler::new(self.providers.clone(), self.linker())
    }

    pub fn portal_link_handler(&self) -> CreatePortalLinkHandler {
        CreatePortalLinkHandler::new(self.providers.clone(), self.store(), self.linker())
    }

    pub fn seats_handler(&self) -> SetSubscriptionSeatsHandler {
        SetSubscriptionSeatsHandler::new(self.providers.clone(), self.store())
    }

    pub fn cancel_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(self.providers.clone(), self.store())
    }
}
