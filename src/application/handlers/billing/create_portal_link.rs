//! CreatePortalLinkHandler - self-service billing portal for an owner.
//!
//! The customer is resolved in order: the id given in the command, the
//! owner's most recent purchase, then the customer directory.

use std::sync::Arc;

use crate::application::{CustomerIdentityLinker, PurchaseStore};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::purchase::{OwnerRef, ProviderKind};
use crate::ports::{PaymentProviderResolver, PortalLinkRequest};

use super::create_checkout_link::is_absolute_url;

#[derive(Debug, Clone)]
pub struct CreatePortalLinkCommand {
    pub owner: OwnerRef,
    /// Restricts resolution to one platform.
    pub provider: Option<ProviderKind>,
    pub customer_id: Option<String>,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatePortalLinkResult {
    pub url: Option<String>,
    pub provider: ProviderKind,
    pub customer_id: String,
}

pub struct CreatePortalLinkHandler {
    resolver: Arc<dyn PaymentProviderResolver>,
    store: PurchaseStore,
    linker: CustomerIdentityLinker,
}

impl CreatePortalLinkHandler {
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

    pub async fn handle(
        &self,
        cmd: CreatePortalLinkCommand,
    ) -> Result<CreatePortalLinkResult, DomainError> {
        if let Some(url) = &cmd.redirect_url {
            if !is_absolute_url(url) {
                return Err(DomainError::validation(
                    "redirect_url",
                    "redirect_url must be an absolute http(s) URL",
                ));
            }
        }

        let (customer_id, kind) = self.resolve_customer(&cmd).await?;
        let provider = self.resolver.resolve(kind)?;

        let url = provider
            .create_customer_portal_link(PortalLinkRequest {
                customer_id: customer_id.clone(),
                redirect_url: cmd.redirect_url,
            })
            .await?;

        tracing::info!(provider = %kind, owner = %cmd.owner, "Portal link created");
        Ok(CreatePortalLinkResult {
            url,
            provider: kind,
            customer_id,
        })
    }

    async fn resolve_customer(
        &self,
        cmd: &CreatePortalLinkCommand,
    ) -> Result<(String, ProviderKind), DomainError> {
        let wanted = |kind: ProviderKind| cmd.provider.map_or(true, |p| p == kind);

        if let Some(customer_id) = cmd.customer_id.as_ref().filter(|id| !id.is_empty()) {
            let kind = match cmd.provider {
                Some(kind) => kind,
                None => self.known_provider(&cmd.owner).await?.ok_or_else(|| {
                    DomainError::validation("provider", "provider is required with customer_id")
                })?,
            };
            return Ok((customer_id.clone(), kind));
        }

        if let Some((customer_id, kind)) = self.store.latest_customer_for(&cmd.owner).await? {
            if wanted(kind) {
                return Ok((customer_id, kind));
            }
        }

        if let Some(link) = self.linker.lookup(&cmd.owner).await? {
            if wanted(link.provider) {
                return Ok((link.customer_id, link.provider));
            }
        }

        Err(DomainError::new(
            ErrorCode::CustomerNotFound,
            format!("No billing customer known for {}", cmd.owner),
        ))
    }

    async fn known_provider(&self, owner: &OwnerRef) -> Result<Option<ProviderKind>, DomainError> {
        if let Some((_, kind)) = self.store.latest_customer_for(owner).await? {
            return Ok(Some(kind));
        }
        Ok(self.linker.lookup(owner).await?.map(|link| link.provider))
    }
}
