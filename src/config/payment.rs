//! Payment provider configuration
//!
//! Every provider section is optional and every field inside it is optional.
//! A provider with missing settings only fails when it is first used, so a
//! half-configured platform never blocks the others from starting.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration for all supported platforms
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Timeout for outbound provider API calls, in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub stripe: StripeSettings,

    #[serde(default)]
    pub lemonsqueezy: LemonSqueezySettings,

    #[serde(default)]
    pub polar: PolarSettings,

    #[serde(default)]
    pub creem: CreemSettings,

    #[serde(default)]
    pub chargebee: ChargebeeSettings,
}

/// Stripe settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeSettings {
    /// Secret API key (sk_live_... or sk_test_...)
    pub api_key: Option<SecretString>,

    /// Webhook signing secret (whsec_...)
    pub webhook_secret: Option<SecretString>,

    /// API base URL override
    pub api_base_url: Option<String>,
}

/// Lemon Squeezy settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LemonSqueezySettings {
    pub api_key: Option<SecretString>,

    /// Signing secret entered when creating the webhook
    pub webhook_secret: Option<SecretString>,

    /// Store that checkouts are created in
    pub store_id: Option<String>,

    pub api_base_url: Option<String>,
}

/// Polar settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolarSettings {
    /// Organization access token
    pub access_token: Option<SecretString>,

    /// Standard Webhooks secret
    pub webhook_secret: Option<SecretString>,

    /// API base URL override (e.g. https://sandbox-api.polar.sh)
    pub api_base_url: Option<String>,
}

/// Creem settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreemSettings {
    pub api_key: Option<SecretString>,

    pub webhook_secret: Option<SecretString>,

    /// API base URL override (e.g. https://test-api.creem.io)
    pub api_base_url: Option<String>,
}

/// Chargebee settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChargebeeSettings {
    /// Site name, as in `<site>.chargebee.com`
    pub site: Option<String>,

    pub api_key: Option<SecretString>,

    /// HTTP Basic username configured on the webhook
    pub webhook_username: Option<String>,

    /// HTTP Basic password configured on the webhook
    pub webhook_password: Option<SecretString>,

    pub api_base_url: Option<String>,
}

impl PaymentConfig {
    /// Validate the settings that are present
    ///
    /// Absent settings are not errors here; they surface as configuration
    /// errors when the provider is first used.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.http_timeout_secs == 0 || self.http_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }

        if let Some(key) = &self.stripe.api_key {
            let key = key.expose_secret();
            if !key.starts_with("sk_") && !key.starts_with("rk_") {
                return Err(ValidationError::InvalidStripeKey);
            }
        }
        if let Some(secret) = &self.stripe.webhook_secret {
            if !secret.expose_secret().starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }

        if let Some(store_id) = &self.lemonsqueezy.store_id {
            if store_id.trim().is_empty() || !store_id.chars().all(|c| c.is_ascii_digit()) {
                return Err(ValidationError::InvalidLemonSqueezyStore);
            }
        }

        if let Some(site) = &self.chargebee.site {
            let valid = !site.is_empty()
                && site
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !valid {
                return Err(ValidationError::InvalidChargebeeSite);
            }
        }

        for (name, url) in [
            ("stripe", &self.stripe.api_base_url),
            ("lemonsqueezy", &self.lemonsqueezy.api_base_url),
            ("polar", &self.polar.api_base_url),
            ("creem", &self.creem.api_base_url),
            ("chargebee", &self.chargebee.api_base_url),
        ] {
            if let Some(url) = url {
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(ValidationError::InvalidApiBaseUrl(name));
                }
            }
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            stripe: StripeSettings::default(),
            lemonsqueezy: LemonSqueezySettings::default(),
            polar: PolarSettings::default(),
            creem: CreemSettings::default(),
            chargebee: ChargebeeSettings::default(),
        }
    }
}

fn default_http_timeout() -> u64 {
    20
}
