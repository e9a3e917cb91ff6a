//! PurchaseStore - find-or-create and lifecycle writes over the repository port.
//!
//! Deliveries arrive at least once and in any order, so every write here
//! tolerates its target being absent or already present.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::purchase::{
    CompletedCheckout, NewOneTimePurchase, NewSubscriptionPurchase, OwnerRef, ProviderKind,
    Purchase, SubscriptionChange, SubscriptionSnapshot, SubscriptionUpdate, WebhookError,
};
use crate::ports::{PurchaseRepository, SaveResult};

/// What a store write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Created,
    Updated,
    /// Target existed and already matched.
    Unchanged,
    Deleted,
    /// Nothing to act on (unknown subscription, duplicate order).
    Absent,
}

#[derive(Clone)]
pub struct PurchaseStore {
    repository: Arc<dyn PurchaseRepository>,
}

impl PurchaseStore {
    pub fn new(repository: Arc<dyn PurchaseRepository>) -> Self {
        Self { repository }
    }

    pub async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Purchase>, DomainError> {
        self.repository.find_by_subscription_id(subscription_id).await
    }

    /// Creates the subscription purchase or updates its lifecycle fields.
    ///
    /// The owner is only read when no row exists yet. A row created by a
    /// concurrent delivery between the lookup and the insert is updated
    /// instead.
    pub async fn upsert_by_subscription_id(
        &self,
        provider: ProviderKind,
        snapshot: &SubscriptionSnapshot,
    ) -> Result<StoreOutcome, WebhookError> {
        let change = snapshot.change();

        if let Some(existing) = self
            .repository
            .find_by_subscription_id(&snapshot.subscription_id)
            .await?
        {
            return Ok(self.write_change(existing, &change).await?);
        }

        let owner = snapshot
            .owner
            .clone()
            .ok_or(WebhookError::MissingMetadata("organization_id or user_id"))?;

        let purchase = Purchase::subscription(NewSubscriptionPurchase {
            provider,
            subscription_id: snapshot.subscription_id.clone(),
            customer_id: snapshot.customer_id.clone(),
            product_id: snapshot.product_id.clone(),
            status: snapshot.status.clone(),
            seats: snapshot.seats,
            owner,
        })?;

        match self.repository.create(&purchase).await? {
            SaveResult::Inserted => {
                tracing::info!(
                    purchase_id = %purchase.id,
                    subscription_id = %snapshot.subscription_id,
                    provider = %provider,
                    "Subscription purchase created"
                );
                Ok(StoreOutcome::Created)
            }
            SaveResult::AlreadyExists => {
                tracing::debug!(
                    subscription_id = %snapshot.subscription_id,
                    "Lost create race, falling back to update"
                );
                let existing = self
                    .repository
                    .find_by_subscription_id(&snapshot.subscription_id)
                    .await?
                    .ok_or_else(|| {
                        WebhookError::Storage(format!(
                            "subscription {} reported as existing but not found",
                            snapshot.subscription_id
                        ))
                    })?;
                Ok(self.write_change(existing, &change).await?)
            }
        }
    }

    /// Applies an update to a known subscription. Unknown ids are a no-op.
    pub async fn apply_update(&self, update: &SubscriptionUpdate) -> Result<StoreOutcome, DomainError> {
        match self
            .repository
            .find_by_subscription_id(&update.subscription_id)
            .await?
        {
            Some(existing) => self.write_change(existing, &update.change()).await,
            None => {
                tracing::debug!(
                    subscription_id = %update.subscription_id,
                    "Update for unknown subscription ignored"
                );
                Ok(StoreOutcome::Absent)
            }
        }
    }

    pub async fn delete_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<StoreOutcome, DomainError> {
        if self.repository.delete_by_subscription_id(subscription_id).await? {
            tracing::info!(subscription_id = %subscription_id, "Subscription purchase deleted");
            Ok(StoreOutcome::Deleted)
        } else {
            Ok(StoreOutcome::Absent)
        }
    }

    /// Records a paid one-time checkout. An order id the same provider has
    /// already delivered is a no-op.
    pub async fn create_one_time(
        &self,
        provider: ProviderKind,
        checkout: &CompletedCheckout,
    ) -> Result<StoreOutcome, WebhookError> {
        let purchase = Purchase::one_time(NewOneTimePurchase {
            provider,
            order_id: checkout.order_id.clone(),
            customer_id: checkout.customer_id.clone(),
            product_id: checkout.product_id.clone(),
            owner: checkout.owner.clone(),
        })?;

        match self.repository.create(&purchase).await? {
            SaveResult::Inserted => {
                tracing::info!(
                    purchase_id = %purchase.id,
                    product_id = %purchase.product_id,
                    provider = %provider,
                    "One-time purchase created"
                );
                Ok(StoreOutcome::Created)
            }
            SaveResult::AlreadyExists => {
                tracing::debug!(
                    provider = %provider,
                    order_id = ?checkout.order_id,
                    "Duplicate one-time order ignored"
                );
                Ok(StoreOutcome::Absent)
            }
        }
    }

    /// Customer id and provider of the owner's most recent purchase.
    pub async fn latest_customer_for(
        &self,
        owner: &OwnerRef,
    ) -> Result<Option<(String, ProviderKind)>, DomainError> {
        let purchases = self.repository.list_by_owner(owner).await?;
        Ok(purchases
            .into_iter()
            .next()
            .map(|p| (p.customer_id, p.provider)))
    }

    async fn write_change(
        &self,
        mut purchase: Purchase,
        change: &SubscriptionChange,
    ) -> Result<StoreOutcome, DomainError> {
        if !purchase.apply_subscription_change(change) {
            return Ok(StoreOutcome::Unchanged);
        }
        if !self.repository.update(&purchase).await? {
            // Deleted between read and write.
            return Ok(StoreOutcome::Absent);
        }
        tracing::info!(
            purchase_id = %purchase.id,
            status = %purchase.status,
            "Subscription purchase updated"
        );
        Ok(StoreOutcome::Updated)
    }
}
