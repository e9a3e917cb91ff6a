//! The closed set of supported payment platforms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// A payment platform this service integrates with.
///
/// Adding a platform is a code change: every `match` over this enum
/// must grow a new arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Stripe,
    LemonSqueezy,
    Polar,
    Creem,
    Chargebee,
}

impl ProviderKind {
    /// Every supported provider, in routing-table order.
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Stripe,
        ProviderKind::LemonSqueezy,
        ProviderKind::Polar,
        ProviderKind::Creem,
        ProviderKind::Chargebee,
    ];

    /// Stable lowercase name, used as the route segment and storage value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Stripe => "stripe",
            ProviderKind::LemonSqueezy => "lemonsqueezy",
            ProviderKind::Polar => "polar",
            ProviderKind::Creem => "creem",
            ProviderKind::Chargebee => "chargebee",
        }
    }

    /// Whether the provider expects `202 Accepted` rather than `204 No Content`
    /// when a delivery has been taken.
    pub fn expects_async_ack(&self) -> bool {
        matches!(self, ProviderKind::Polar)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stripe" => Ok(ProviderKind::Stripe),
            "lemonsqueezy" | "lemon-squeezy" | "lemon_squeezy" => Ok(ProviderKind::LemonSqueezy),
            "polar" => Ok(ProviderKind::Polar),
            "creem" => Ok(ProviderKind::Creem),
            "chargebee" => Ok(ProviderKind::Chargebee),
            other => Err(ValidationError::invalid_format(
                "provider",
                format!("unknown payment provider '{}'", other),
            )),
        }
    }
}
