//! In-memory implementation of CustomerDirectory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::domain::purchase::OwnerRef;
use crate::ports::{CustomerDirectory, CustomerLink};

#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerDirectory {
    links: Arc<RwLock<HashMap<OwnerRef, CustomerLink>>>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.links.read().await.len()
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn link_customer_to_owner(&self, link: &CustomerLink) -> Result<(), DomainError> {
        self.links
            .write()
            .await
            .insert(link.owner.clone(), link.clone());
        Ok(())
    }

    async fn find_by_owner(&self, owner: &OwnerRef) -> Result<Option<CustomerLink>, DomainError> {
        Ok(self.links.read().await.get(owner).cloned())
    }
}
