//! Provider-neutral classification of a verified webhook.
//!
//! Each adapter parses its own payload shape and produces exactly one
//! [`BillingEvent`]. The application layer applies it without knowing
//! which platform sent it.

use super::{OwnerRef, PurchaseStatus, SubscriptionChange};

/// A verified webhook delivery, reduced to what the purchase store needs.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingEvent {
    /// A one-time checkout has been paid.
    OneTimeCompleted(CompletedCheckout),
    /// A subscription was created or became active.
    SubscriptionActivated(SubscriptionSnapshot),
    /// Status, product or seats of a subscription changed.
    SubscriptionUpdated(SubscriptionUpdate),
    /// The subscription has ended.
    SubscriptionTerminated { subscription_id: String },
    /// Valid delivery this service does not act on.
    Ignored { event_type: String },
}

impl BillingEvent {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            BillingEvent::OneTimeCompleted(_) => "one_time_completed",
            BillingEvent::SubscriptionActivated(_) => "subscription_activated",
            BillingEvent::SubscriptionUpdated(_) => "subscription_updated",
            BillingEvent::SubscriptionTerminated { .. } => "subscription_terminated",
            BillingEvent::Ignored { .. } => "ignored",
        }
    }

    pub fn ignored(event_type: impl Into<String>) -> Self {
        BillingEvent::Ignored {
            event_type: event_type.into(),
        }
    }

    pub fn terminated(subscription_id: impl Into<String>) -> Self {
        BillingEvent::SubscriptionTerminated {
            subscription_id: subscription_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedCheckout {
    /// Provider order/checkout id, when the payload carries one.
    pub order_id: Option<String>,
    pub customer_id: String,
    pub product_id: String,
    pub owner: OwnerRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionSnapshot {
    pub subscription_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub status: PurchaseStatus,
    pub seats: Option<u32>,
    /// Required only when no purchase exists yet for this subscription.
    pub owner: Option<OwnerRef>,
}

impl SubscriptionSnapshot {
    pub fn change(&self) -> SubscriptionChange {
        SubscriptionChange {
            status: self.status.clone(),
            product_id: Some(self.product_id.clone()),
            seats: self.seats,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionUpdate {
    pub subscription_id: String,
    pub status: PurchaseStatus,
    pub product_id: Option<String>,
    pub seats: Option<u32>,
}

impl SubscriptionUpdate {
    pub fn change(&self) -> SubscriptionChange {
        SubscriptionChange {
            status: self.status.clone(),
            product_id: self.product_id.clone(),
            seats: self.seats,
        }
    }
}
