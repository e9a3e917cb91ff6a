//! SetSubscriptionSeatsHandler - change the seat quantity on the platform.
//!
//! The stored purchase is not modified here; the platform's update webhook
//! carries the new quantity back.

use std::sync::Arc;

use crate::application::PurchaseStore;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{PaymentError, PaymentProviderResolver};

#[derive(Debug, Clone)]
pub struct SetSubscriptionSeatsCommand {
    pub subscription_id: String,
    pub seats: u32,
}

pub struct SetSubscriptionSeatsHandler {
    resolver: Arc<dyn PaymentProviderResolver>,
    store: PurchaseStore,
}

impl SetSubscriptionSeatsHandler {
    pub fn new(resolver: Arc<dyn PaymentProviderResolver>, store: PurchaseStore) -> Self {
        Self { resolver, store }
    }

    pub async fn handle(&self, cmd: SetSubscriptionSeatsCommand) -> Result<(), DomainError> {
        if cmd.seats == 0 {
            return Err(DomainError::validation("seats", "seats must be at least 1"));
        }

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
        let seats = provider
            .seat_management()
            .ok_or_else(|| PaymentError::unsupported(purchase.provider, "seat management"))?;

        seats
            .set_subscription_seats(&cmd.subscription_id, cmd.seats)
            .await?;

        tracing::info!(
            provider = %purchase.provider,
            subscription_id = %cmd.subscription_id,
            seats = cmd.seats,
            "Subscription seats updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPurchaseRepository;
    use crate::application::handlers::billing::test_support::{FakeProvider, FakeResolver};
    use crate::domain::purchase::test_support::{new_subscription, org};
    use crate::domain::purchase::{NewSubscriptionPurchase, ProviderKind, Purchase};
    use crate::ports::PurchaseRepository;

    async fn handler_with(
        provider: FakeProvider,
        stored_on: ProviderKind,
    ) -> (SetSubscriptionSeatsHandler, Arc<FakeProvider>) {
        let provider = Arc::new(provider);
        let repo = InMemoryPurchaseRepository::new();
        let purchase = Purchase::subscription(NewSubscriptionPurchase {
            provider: stored_on,
            ..new_subscription("sub_1", org("org_1"))
        })
        .unwrap();
        repo.create(&purchase).await.unwrap();

        let handler = SetSubscriptionSeatsHandler::new(
            Arc::new(FakeResolver::default().with(provider.clone())),
            PurchaseStore::new(Arc::new(repo)),
        );
        (handler, provider)
    }

    fn command(subscription_id: &str, seats: u32) -> SetSubscriptionSeatsCommand {
        SetSubscriptionSeatsCommand {
            subscription_id: subscription_id.into(),
            seats,
        }
    }

    #[tokio::test]
    async fn calls_out_to_owning_provider() {
        let (handler, provider) =
            handler_with(FakeProvider::new(ProviderKind::Stripe), ProviderKind::Stripe).await;

        handler.handle(command("sub_1", 5)).await.unwrap();

        assert_eq!(provider.calls(), vec!["seats:sub_1:5"]);
    }

    #[tokio::test]
    async fn provider_without_capability_is_unsupported() {
        let (handler, provider) = handler_with(
            FakeProvider::new(ProviderKind::Polar).without_seats(),
            ProviderKind::Polar,
        )
        .await;

        let err = handler.handle(command("sub_1", 5)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::CapabilityUnsupported);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_subscription_is_not_found() {
        let (handler, _) =
            handler_with(FakeProvider::new(ProviderKind::Stripe), ProviderKind::Stripe).await;
        let err = handler.handle(command("sub_404", 2)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PurchaseNotFound);
    }

    #[tokio::test]
    async fn zero_seats_is_invalid() {
        let (handler, provider) =
            handler_with(FakeProvider::new(ProviderKind::Stripe), ProviderKind::Stripe).await;
        let err = handler.handle(command("sub_1", 0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(provider.calls().is_empty());
    }
}
