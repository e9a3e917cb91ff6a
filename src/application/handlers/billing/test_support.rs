//! Hand-written provider fakes shared by the billing handler tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::purchase::{BillingEvent, ProviderKind, WebhookError};
use crate::ports::{
    CheckoutLinkRequest, PaymentError, PaymentProvider, PaymentProviderResolver,
    PortalLinkRequest, SeatManagement, SubscriptionCancellation, WebhookRequest,
};

pub struct FakeProvider {
    kind: ProviderKind,
    /// `None` makes verification fail with `InvalidSignature`.
    event: Option<BillingEvent>,
    supports_seats: bool,
    supports_cancel: bool,
    fail_outbound: bool,
    pub checkout_requests: Mutex<Vec<CheckoutLinkRequest>>,
    pub portal_requests: Mutex<Vec<PortalLinkRequest>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            event: None,
            supports_seats: true,
            supports_cancel: true,
            fail_outbound: false,
            checkout_requests: Mutex::new(Vec::new()),
            portal_requests: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_event(mut self, event: BillingEvent) -> Self {
        self.event = Some(event);
        self
    }

    pub fn without_seats(mut self) -> Self {
        self.supports_seats = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_outbound = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn outbound(&self) -> Result<(), PaymentError> {
        if self.fail_outbound {
            return Err(PaymentError::from_status(self.kind, 500, "boom"));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn create_checkout_link(
        &self,
        request: CheckoutLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        self.outbound()?;
        self.checkout_requests.lock().unwrap().push(request);
        Ok(Some(format!("https://pay.example/{}/checkout", self.kind)))
    }

    async fn create_customer_portal_link(
        &self,
        request: PortalLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        self.outbound()?;
        let url = format!("https://pay.example/portal/{}", request.customer_id);
        self.portal_requests.lock().unwrap().push(request);
        Ok(Some(url))
    }

    async fn verify_webhook(
        &self,
        _request: &WebhookRequest<'_>,
    ) -> Result<BillingEvent, WebhookError> {
        self.event.clone().ok_or(WebhookError::InvalidSignature)
    }

    fn seat_management(&self) -> Option<&dyn SeatManagement> {
        self.supports_seats.then_some(self as &dyn SeatManagement)
    }

    fn cancellation(&self) -> Option<&dyn SubscriptionCancellation> {
        self.supports_cancel.then_some(self as &dyn SubscriptionCancellation)
    }
}

#[async_trait]
impl SeatManagement for FakeProvider {
    async fn set_subscription_seats(
        &self,
        subscription_id: &str,
        seats: u32,
    ) -> Result<(), PaymentError> {
        self.outbound()?;
        self.calls
            .lock()
            .unwrap()
            .push(format!("seats:{}:{}", subscription_id, seats));
        Ok(())
    }
}

#[async_trait]
impl SubscriptionCancellation for FakeProvider {
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), PaymentError> {
        self.outbound()?;
        self.calls
            .lock()
            .unwrap()
            .push(format!("cancel:{}", subscription_id));
        Ok(())
    }
}

/// Resolves only the providers it was given; others are unconfigured.
#[derive(Default)]
pub struct FakeResolver {
    providers: HashMap<ProviderKind, Arc<FakeProvider>>,
}

impl FakeResolver {
    pub fn with(mut self, provider: Arc<FakeProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }
}

impl PaymentProviderResolver for FakeResolver {
    fn resolve(&self, kind: ProviderKind) -> Result<Arc<dyn PaymentProvider>, PaymentError> {
        self.providers
            .get(&kind)
            .cloned()
            .map(|p| p as Arc<dyn PaymentProvider>)
            .ok_or_else(|| PaymentError::configuration(kind, "api_key"))
    }
}
