//! CreateCheckoutLinkHandler - hosted checkout on the chosen platform.

use std::sync::Arc;

use crate::application::CustomerIdentityLinker;
use crate::domain::foundation::DomainError;
use crate::domain::purchase::{ProviderKind, PurchaseType};
use crate::ports::{CheckoutLinkRequest, PaymentProviderResolver};

/// Command to create a checkout link.
#[derive(Debug, Clone)]
pub struct CreateCheckoutLinkCommand {
    pub provider: ProviderKind,
    pub request: CheckoutLinkRequest,
}

pub struct CreateCheckoutLinkHandler {
    resolver: Arc<dyn PaymentProviderResolver>,
    linker: CustomerIdentityLinker,
}

impl CreateCheckoutLinkHandler {
    pub fn new(resolver: Arc<dyn PaymentProviderResolver>, linker: CustomerIdentityLinker) -> Self {
        Self { resolver, linker }
    }

    /// Returns the checkout URL, or `None` if the platform answered without one.
    pub async fn handle(&self, cmd: CreateCheckoutLinkCommand) -> Result<Option<String>, DomainError> {
        let mut request = cmd.request;
        validate(&request)?;

        let provider = self.resolver.resolve(cmd.provider)?;

        // Reuse the owner's customer record on the same platform.
        if request.customer_id.is_none() {
            if let Some(link) = self.linker.lookup(&request.owner).await? {
                if link.provider == cmd.provider {
                    request.customer_id = Some(link.customer_id);
                }
            }
        }

        let owner = request.owner.clone();
        let url = provider.create_checkout_link(request).await?;

        tracing::info!(
            provider = %cmd.provider,
            owner = %owner,
            has_url = url.is_some(),
            "Checkout link created"
        );
        Ok(url)
    }
}

fn validate(request: &CheckoutLinkRequest) -> Result<(), DomainError> {
    if request.product_id.trim().is_empty() {
        return Err(DomainError::validation("product_id", "product_id is required"));
    }
    if !is_absolute_url(&request.redirect_url) {
        return Err(DomainError::validation(
            "redirect_url",
            "redirect_url must be an absolute http(s) URL",
        ));
    }
    if request.seats == Some(0) {
        return Err(DomainError::validation("seats", "seats must be at least 1"));
    }
    if request.trial_period_days.is_some() && request.purchase_type != PurchaseType::Subscription {
        return Err(DomainError::validation(
            "trial_period_days",
            "trials only apply to subscriptions",
        ));
    }
    Ok(())
}

pub(crate) fn is_absolute_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}
