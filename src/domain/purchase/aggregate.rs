//! Purchase entity - the canonical record of a sale or subscription.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{PurchaseId, Timestamp, ValidationError};

use super::{OwnerRef, ProviderKind, PurchaseStatus};

/// Kind of purchase. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseType {
    OneTime,
    Subscription,
}

impl PurchaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseType::OneTime => "ONE_TIME",
            PurchaseType::Subscription => "SUBSCRIPTION",
        }
    }
}

impl fmt::Display for PurchaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PurchaseType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONE_TIME" => Ok(PurchaseType::OneTime),
            "SUBSCRIPTION" => Ok(PurchaseType::Subscription),
            other => Err(ValidationError::invalid_format(
                "type",
                format!("unknown purchase type '{}'", other),
            )),
        }
    }
}

/// Canonical purchase record.
///
/// The owner and type are fixed at construction; only the lifecycle
/// fields (`status`, `product_id`, `seats`) change afterwards, and only
/// through [`Purchase::apply_subscription_change`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub provider: ProviderKind,
    pub purchase_type: PurchaseType,
    /// Present iff `purchase_type` is `Subscription`.
    pub subscription_id: Option<String>,
    /// Provider order/checkout id; deduplicates one-time deliveries.
    pub order_id: Option<String>,
    pub customer_id: String,
    pub product_id: String,
    pub status: PurchaseStatus,
    pub seats: Option<u32>,
    owner: OwnerRef,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields for recording a completed one-time checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOneTimePurchase {
    pub provider: ProviderKind,
    pub order_id: Option<String>,
    pub customer_id: String,
    pub product_id: String,
    pub owner: OwnerRef,
}

/// Fields for recording a newly activated subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscriptionPurchase {
    pub provider: ProviderKind,
    pub subscription_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub status: PurchaseStatus,
    pub seats: Option<u32>,
    pub owner: OwnerRef,
}

/// Mutable lifecycle fields carried by subscription events.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionChange {
    pub status: PurchaseStatus,
    /// `None` leaves the stored product untouched.
    pub product_id: Option<String>,
    /// `None` leaves the stored seat count untouched.
    pub seats: Option<u32>,
}

impl Purchase {
    pub fn one_time(new: NewOneTimePurchase) -> Result<Self, ValidationError> {
        require_non_empty("customer_id", &new.customer_id)?;
        require_non_empty("product_id", &new.product_id)?;

        let now = Timestamp::now();
        Ok(Self {
            id: PurchaseId::new(),
            provider: new.provider,
            purchase_type: PurchaseType::OneTime,
            subscription_id: None,
            order_id: new.order_id.filter(|id| !id.is_empty()),
            customer_id: new.customer_id,
            product_id: new.product_id,
            status: PurchaseStatus::Active,
            seats: None,
            owner: new.owner,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn subscription(new: NewSubscriptionPurchase) -> Result<Self, ValidationError> {
        require_non_empty("subscription_id", &new.subscription_id)?;
        require_non_empty("customer_id", &new.customer_id)?;
        require_non_empty("product_id", &new.product_id)?;

        let now = Timestamp::now();
        Ok(Self {
            id: PurchaseId::new(),
            provider: new.provider,
            purchase_type: PurchaseType::Subscription,
            subscription_id: Some(new.subscription_id),
            order_id: None,
            customer_id: new.customer_id,
            product_id: new.product_id,
            status: new.status,
            seats: new.seats,
            owner: new.owner,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitutes a purchase from storage. Performs no lifecycle checks.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: PurchaseId,
        provider: ProviderKind,
        purchase_type: PurchaseType,
        subscription_id: Option<String>,
        order_id: Option<String>,
        customer_id: String,
        product_id: String,
        status: PurchaseStatus,
        seats: Option<u32>,
        owner: OwnerRef,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            provider,
            purchase_type,
            subscription_id,
            order_id,
            customer_id,
            product_id,
            status,
            seats,
            owner,
            created_at,
            updated_at,
        }
    }

    pub fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    /// Applies a subscription lifecycle change in place.
    ///
    /// Returns `true` if any stored field changed. The owner, type and
    /// identifiers are never touched.
    pub fn apply_subscription_change(&mut self, change: &SubscriptionChange) -> bool {
        let mut changed = false;

        if self.status != change.status {
            self.status = change.status.clone();
            changed = true;
        }
        if let Some(product_id) = change.product_id.as_ref().filter(|p| !p.is_empty()) {
            if &self.product_id != product_id {
                self.product_id = product_id.clone();
                changed = true;
            }
        }
        if change.seats.is_some() && self.seats != change.seats {
            self.seats = change.seats;
            changed = true;
        }

        if changed {
            self.updated_at = Timestamp::now();
        }
        changed
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    Ok(())
}
