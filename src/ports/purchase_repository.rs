//! Purchase repository port.
//!
//! Defines the contract for persisting canonical purchases. The store
//! behind it is opaque; "not found" is always a normal outcome
//! (`Option`/`bool`), never an error.
//!
//! # Uniqueness
//!
//! Implementations must enforce uniqueness of `subscription_id` and of
//! `order_id` when present. This is the only guard against two concurrent
//! deliveries both creating a row; callers rely on
//! [`SaveResult::AlreadyExists`] to detect that they lost the race.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::purchase::{OwnerRef, Purchase};

/// Result of attempting to insert a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Row was inserted.
    Inserted,
    /// A row with the same subscription id or order id already exists.
    AlreadyExists,
}

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Find the purchase for a subscription.
    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Purchase>, DomainError>;

    /// Insert a new purchase.
    ///
    /// Uses `ON CONFLICT DO NOTHING` semantics on the unique keys.
    async fn create(&self, purchase: &Purchase) -> Result<SaveResult, DomainError>;

    /// Persist the lifecycle fields (`status`, `product_id`, `seats`,
    /// `updated_at`) of an existing purchase.
    ///
    /// Owner and type columns are never written. Returns `false` if the
    /// row no longer exists.
    async fn update(&self, purchase: &Purchase) -> Result<bool, DomainError>;

    /// Delete the purchase for a subscription.
    ///
    /// Returns `false` if there was nothing to delete.
    async fn delete_by_subscription_id(&self, subscription_id: &str)
        -> Result<bool, DomainError>;

    /// All purchases of an owner, newest first.
    async fn list_by_owner(&self, owner: &OwnerRef) -> Result<Vec<Purchase>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn PurchaseRepository) {}
    }
}
