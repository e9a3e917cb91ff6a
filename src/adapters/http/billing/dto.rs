//! Data Transfer Objects for billing endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;
use crate::domain::purchase::{OwnerRef, ProviderKind, PurchaseType};
use crate::ports::CheckoutLinkRequest;

/// Owner given as exactly one of the two ids.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerDto {
    pub organization_id: Option<String>,
    pub user_id: Option<String>,
}

impl OwnerDto {
    pub fn into_owner(self) -> Result<OwnerRef, ValidationError> {
        OwnerRef::from_metadata(self.organization_id.as_deref(), self.user_id.as_deref())?
            .ok_or_else(|| ValidationError::empty_field("organization_id or user_id"))
    }
}

/// Request body for `POST /billing/checkout-link`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutLinkRequestDto {
    pub provider: ProviderKind,
    #[serde(rename = "type")]
    pub purchase_type: PurchaseType,
    pub product_id: String,
    pub redirect_url: String,
    #[serde(flatten)]
    pub owner: OwnerDto,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub seats: Option<u32>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub trial_period_days: Option<u32>,
}

impl CheckoutLinkRequestDto {
    pub fn into_request(self) -> Result<(ProviderKind, CheckoutLinkRequest), ValidationError> {
        let owner = self.owner.into_owner()?;
        Ok((
            self.provider,
            CheckoutLinkRequest {
                purchase_type: self.purchase_type,
                product_id: self.product_id,
                redirect_url: self.redirect_url,
                email: self.email,
                name: self.name,
                owner,
                seats: self.seats,
                customer_id: self.customer_id,
                trial_period_days: self.trial_period_days,
            },
        ))
    }
}

/// Request body for `POST /billing/portal-link`.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalLinkRequestDto {
    #[serde(flatten)]
    pub owner: OwnerDto,
    #[serde(default)]
    pub provider: Option<ProviderKind>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Request body for `PUT /billing/subscriptions/:id/seats`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetSeatsRequestDto {
    pub seats: u32,
}

/// Response carrying a hosted link. `url` is null when the platform
/// returned none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkResponse {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalLinkResponse {
    pub url: Option<String>,
    pub provider: ProviderKind,
    pub customer_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_request_deserializes_flattened_owner() {
        let dto: CheckoutLinkRequestDto = serde_json::from_value(serde_json::json!({
            "provider": "creem",
            "type": "ONE_TIME",
            "product_id": "p_123",
            "redirect_url": "https://app.example/done",
            "organization_id": "org_1"
        }))
        .unwrap();

        let (provider, request) = dto.into_request().unwrap();
        assert_eq!(provider, ProviderKind::Creem);
        assert_eq!(request.purchase_type, PurchaseType::OneTime);
        assert_eq!(request.owner, OwnerRef::organization("org_1").unwrap());
        assert!(request.seats.is_none());
    }

    #[test]
    fn owner_is_required() {
        let err = OwnerDto::default().into_owner().unwrap_err();
        assert!(err.to_string().contains("organization_id or user_id"));
    }

    #[test]
    fn both_owner_ids_are_rejected() {
        let dto = OwnerDto {
            organization_id: Some("org_1".into()),
            user_id: Some("usr_1".into()),
        };
        assert!(dto.into_owner().is_err());
    }

    #[test]
    fn unknown_provider_fails_to_deserialize() {
        let result: Result<PortalLinkRequestDto, _> = serde_json::from_value(serde_json::json!({
            "user_id": "usr_1",
            "provider": "paddle"
        }));
        assert!(result.is_err());
    }
}
