//! In-memory implementation of PurchaseRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, PurchaseId};
use crate::domain::purchase::{OwnerRef, Purchase};
use crate::ports::{PurchaseRepository, SaveResult};

/// Purchases keyed by id. Subscription ids are unique; order ids are unique
/// per provider.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPurchaseRepository {
    purchases: Arc<RwLock<HashMap<PurchaseId, Purchase>>>,
}

impl InMemoryPurchaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored purchase (for test assertions).
    pub async fn all(&self) -> Vec<Purchase> {
        self.purchases.read().await.values().cloned().collect()
    }

    pub async fn count(&self) -> usize {
        self.purchases.read().await.len()
    }
}

fn conflicts(existing: &Purchase, candidate: &Purchase) -> bool {
    let same_subscription = candidate.subscription_id.is_some()
        && existing.subscription_id == candidate.subscription_id;
    let same_order = candidate.order_id.is_some()
        && existing.provider == candidate.provider
        && existing.order_id == candidate.order_id;
    existing.id == candidate.id || same_subscription || same_order
}

#[async_trait]
impl PurchaseRepository for InMemoryPurchaseRepository {
    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Purchase>, DomainError> {
        let purchases = self.purchases.read().await;
        Ok(purchases
            .values()
            .find(|p| p.subscription_id.as_deref() == Some(subscription_id))
            .cloned())
    }

    async fn create(&self, purchase: &Purchase) -> Result<SaveResult, DomainError> {
        let mut purchases = self.purchases.write().await;
        if purchases.values().any(|existing| conflicts(existing, purchase)) {
            return Ok(SaveResult::AlreadyExists);
        }
        purchases.insert(purchase.id, purchase.clone());
        Ok(SaveResult::Inserted)
    }

    async fn update(&self, purchase: &Purchase) -> Result<bool, DomainError> {
        let mut purchases = self.purchases.write().await;
        match purchases.get_mut(&purchase.id) {
            Some(stored) => {
                stored.status = purchase.status.clone();
                stored.product_id = purchase.product_id.clone();
                stored.seats = purchase.seats;
                stored.updated_at = purchase.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_subscription_id(&self, subscription_id: &str) -> Result<bool, DomainError> {
        let mut purchases = self.purchases.write().await;
        let before = purchases.len();
        purchases.retain(|_, p| p.subscription_id.as_deref() != Some(subscription_id));
        Ok(purchases.len() != before)
    }

    async fn list_by_owner(&self, owner: &OwnerRef) -> Result<Vec<Purchase>, DomainError> {
        let purchases = self.purchases.read().await;
        let mut owned: Vec<Purchase> = purchases
            .values()
            .filter(|p| p.owner() == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}
