//! ProcessWebhookHandler - verifies a provider delivery and applies it to the purchase store.

use std::sync::Arc;

use axum::body::Bytes;
use http::HeaderMap;

use crate::application::{CustomerIdentityLinker, PurchaseStore, StoreOutcome};
use crate::domain::purchase::{BillingEvent, OwnerRef, ProviderKind, WebhookError};
use crate::ports::{PaymentProviderResolver, WebhookRequest};

/// Command carrying one raw webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    pub provider: ProviderKind,
    pub headers: HeaderMap,
    /// Exact request body; verified before it is parsed.
    pub body: Bytes,
}

/// What the delivery did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Created,
    Updated,
    Deleted,
    /// Valid delivery that changed nothing (replay, reordering, duplicate).
    Unchanged,
    /// Event type this service does not act on.
    Ignored,
}

impl From<StoreOutcome> for WebhookOutcome {
    fn from(outcome: StoreOutcome) -> Self {
        match outcome {
            StoreOutcome::Created => WebhookOutcome::Created,
            StoreOutcome::Updated => WebhookOutcome::Updated,
            StoreOutcome::Deleted => WebhookOutcome::Deleted,
            StoreOutcome::Unchanged | StoreOutcome::Absent => WebhookOutcome::Unchanged,
        }
    }
}

/// Handler for inbound payment webhooks.
///
/// Each delivery performs at most one purchase write (create, update or
/// delete) plus a customer link for creation-shaped events. Nothing is
/// written when verification fails.
pub struct ProcessWebhookHandler {
    resolver: Arc<dyn PaymentProviderResolver>,
    store: PurchaseStore,
    linker: CustomerIdentityLinker,
}

impl ProcessWebhookHandler {
    pub fn new(
        resolver: Arc<dyn PaymentProviderResolver>,
        store: PurchaseStore,
        linker: CustomerIdentityLinker,
    ) -> Self {
        Self {
            resolver,
            store,
            linker,
        }
    }

    pub async fn handle(&self, cmd: ProcessWebhookCommand) -> Result<WebhookOutcome, WebhookError> {
        let kind = cmd.provider;
        let provider = self.resolver.resolve(kind).map_err(|e| {
            tracing::error!(provider = %kind, error = %e, "Webhook received for unconfigured provider");
            WebhookError::from(e)
        })?;

        let request = WebhookRequest::new(&cmd.headers, &cmd.body);
        let event = provider.verify_webhook(&request).await.map_err(|e| {
            if e.is_verification_failure() {
                tracing::warn!(provider = %kind, error = %e, "Webhook signature rejected");
            } else {
                tracing::warn!(provider = %kind, error = %e, "Verified webhook has a malformed payload");
            }
            e
        })?;

        let label = event.label();
        let outcome = self.apply(kind, event).await.map_err(|e| {
            if e.is_retryable() {
                tracing::error!(provider = %kind, event = label, error = %e, "Failed to apply webhook");
            } else {
                tracing::warn!(provider = %kind, event = label, error = %e, "Webhook payload rejected");
            }
            e
        })?;

        tracing::info!(provider = %kind, event = label, outcome = ?outcome, "Webhook processed");
        Ok(outcome)
    }

    async fn apply(
        &self,
        kind: ProviderKind,
        event: BillingEvent,
    ) -> Result<WebhookOutcome, WebhookError> {
        match event {
            BillingEvent::OneTimeCompleted(checkout) => {
                let outcome = self.store.create_one_time(kind, &checkout).await?;
                if outcome == StoreOutcome::Created {
                    self.link(&checkout.owner, &checkout.customer_id, kind).await?;
                }
                Ok(outcome.into())
            }
            BillingEvent::SubscriptionActivated(snapshot) => {
                let outcome = self.store.upsert_by_subscription_id(kind, &snapshot).await?;
                // Later deliveries link the stored owner, never the payload's.
                let owner = match (outcome, &snapshot.owner) {
                    (StoreOutcome::Created, Some(owner)) => Some(owner.clone()),
                    _ => self
                        .store
                        .find_by_subscription_id(&snapshot.subscription_id)
                        .await?
                        .map(|purchase| purchase.owner().clone()),
                };
                if let Some(owner) = owner {
                    self.link(&owner, &snapshot.customer_id, kind).await?;
                }
                Ok(outcome.into())
            }
            BillingEvent::SubscriptionUpdated(update) => {
                Ok(self.store.apply_update(&update).await?.into())
            }
            BillingEvent::SubscriptionTerminated { subscription_id } => Ok(self
                .store
                .delete_by_subscription_id(&subscription_id)
                .await?
                .into()),
            BillingEvent::Ignored { event_type } => {
                tracing::debug!(provider = %kind, event_type = %event_type, "Unhandled webhook event type");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn link(
        &self,
        owner: &OwnerRef,
        customer_id: &str,
        kind: ProviderKind,
    ) -> Result<(), WebhookError> {
        self.linker.link(owner, customer_id, kind).await?;
        Ok(())
    }
}
