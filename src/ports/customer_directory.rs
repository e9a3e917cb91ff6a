//! Customer directory port.
//!
//! Maps an internal owner (organization or user) to the external customer
//! id a payment platform assigned to it. One mapping per owner; writes
//! overwrite.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::purchase::{OwnerRef, ProviderKind};

/// Link between an owner and their external customer record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerLink {
    pub owner: OwnerRef,
    pub customer_id: String,
    pub provider: ProviderKind,
    pub linked_at: Timestamp,
}

impl CustomerLink {
    pub fn new(owner: OwnerRef, customer_id: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            owner,
            customer_id: customer_id.into(),
            provider,
            linked_at: Timestamp::now(),
        }
    }
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Store the link, replacing any existing link for the same owner.
    async fn link_customer_to_owner(&self, link: &CustomerLink) -> Result<(), DomainError>;

    /// Current link for an owner, if any.
    async fn find_by_owner(&self, owner: &OwnerRef) -> Result<Option<CustomerLink>, DomainError>;
}
