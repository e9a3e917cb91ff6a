//! CustomerIdentityLinker - remembers which external customer belongs to an owner.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::purchase::{OwnerRef, ProviderKind};
use crate::ports::{CustomerDirectory, CustomerLink};

#[derive(Clone)]
pub struct CustomerIdentityLinker {
    directory: Arc<dyn CustomerDirectory>,
}

impl CustomerIdentityLinker {
    pub fn new(directory: Arc<dyn CustomerDirectory>) -> Self {
        Self { directory }
    }

    /// Links `customer_id` to `owner`, last write wins.
    ///
    /// Returns `false` when the owner was already linked to this customer.
    pub async fn link(
        &self,
        owner: &OwnerRef,
        customer_id: &str,
        provider: ProviderKind,
    ) -> Result<bool, DomainError> {
        if customer_id.is_empty() {
            return Ok(false);
        }

        if let Some(existing) = self.directory.find_by_owner(owner).await? {
            if existing.customer_id == customer_id && existing.provider == provider {
                return Ok(false);
            }
        }

        self.directory
            .link_customer_to_owner(&CustomerLink::new(owner.clone(), customer_id, provider))
            .await?;
        tracing::debug!(owner = %owner, customer_id = %customer_id, "Customer linked to owner");
        Ok(true)
    }

    pub async fn lookup(&self, owner: &OwnerRef) -> Result<Option<CustomerLink>, DomainError> {
        self.directory.find_by_owner(owner).await
    }
}
