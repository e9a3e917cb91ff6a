//! Canonical purchase status.
//!
//! Every platform reports subscription state with its own vocabulary.
//! [`PurchaseStatus::canonicalize`] folds those strings into one set while
//! keeping anything unrecognised verbatim in [`PurchaseStatus::Other`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PurchaseStatus {
    Active,
    Trialing,
    PastDue,
    Paused,
    Canceled,
    Expired,
    Incomplete,
    /// Provider status with no canonical equivalent, stored as received.
    Other(String),
}

impl PurchaseStatus {
    /// Maps a provider status string onto the canonical set.
    ///
    /// Matching is case-insensitive and treats `-` and spaces like `_`.
    pub fn canonicalize(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");

        match normalized.as_str() {
            "active" | "non_renewing" | "scheduled_cancel" => PurchaseStatus::Active,
            "trialing" | "on_trial" | "in_trial" => PurchaseStatus::Trialing,
            "past_due" | "unpaid" => PurchaseStatus::PastDue,
            "paused" => PurchaseStatus::Paused,
            "canceled" | "cancelled" => PurchaseStatus::Canceled,
            "expired" | "incomplete_expired" | "transferred" => PurchaseStatus::Expired,
            "incomplete" | "future" | "pending" => PurchaseStatus::Incomplete,
            _ => PurchaseStatus::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PurchaseStatus::Active => "active",
            PurchaseStatus::Trialing => "trialing",
            PurchaseStatus::PastDue => "past_due",
            PurchaseStatus::Paused => "paused",
            PurchaseStatus::Canceled => "canceled",
            PurchaseStatus::Expired => "expired",
            PurchaseStatus::Incomplete => "incomplete",
            PurchaseStatus::Other(raw) => raw,
        }
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for PurchaseStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PurchaseStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(PurchaseStatus::canonicalize(&raw))
    }
}
