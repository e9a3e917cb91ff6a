//! CancelSubscriptionHandler - cancel a subscription on its platform.

use std::sync::Arc;

use crate::application::PurchaseStore;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{PaymentError, PaymentProviderResolver};

#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub subscription_id: String,
}

/// Cancels on the platform. The purchase row is removed or updated later,
/// when the platform's own webhook arrives.
pub struct CancelSubscriptionHandler {
    resolver: Arc<dyn PaymentProviderResolver>,
    store: PurchaseStore,
}

impl CancelSubscriptionHandler {
    pub fn new(resolver: Arc<dyn PaymentProviderResolver>, store: PurchaseStore) -> Self {
        Self { resolver, store }
    }

    pub async fn handle(&self, cmd: CancelSubscriptionCommand) -> Result<(), DomainError> {
        let purchase = self
            .store
            .find_by_subscription_id(&cmd.subscription_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::PurchaseNotFound,
                    format!("No purchase for subscription {}", cmd.subscription_id),
                )
            })?;

        let provider = self.resolver.resolve(purchase.provider)?;
        let cancellation = provider
            .cancellation()
            .ok_or_else(|| PaymentError::unsupported(purchase.provider, "cancellation"))?;

        cancellation.cancel_subscription(&cmd.subscription_id).await?;

        tracing::info!(
            provider = %purchase.provider,
            subscription_id = %cmd.subscription_id,
            "Subscription cancellation requested"
        );
        Ok(())
    }
}
