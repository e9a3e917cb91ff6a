//! Lazily-initialised provider adapters.
//!
//! Each platform is built the first time it is resolved. A platform with
//! missing settings fails with a configuration error at that point and is
//! retried on the next call; the other platforms are unaffected.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::config::PaymentConfig;
use crate::domain::purchase::ProviderKind;
use crate::ports::{PaymentError, PaymentProvider, PaymentProviderResolver};

use super::{
    ChargebeeAdapter, ChargebeeConfig, CreemAdapter, CreemConfig, LemonSqueezyAdapter,
    LemonSqueezyConfig, PolarAdapter, PolarConfig, ProviderAdapter, StripeAdapter, StripeConfig,
};

/// Registry of platform adapters keyed by [`ProviderKind`].
pub struct ProviderRegistry {
    config: PaymentConfig,
    http_client: reqwest::Client,
    stripe: OnceCell<Arc<ProviderAdapter>>,
    lemonsqueezy: OnceCell<Arc<ProviderAdapter>>,
    polar: OnceCell<Arc<ProviderAdapter>>,
    creem: OnceCell<Arc<ProviderAdapter>>,
    chargebee: OnceCell<Arc<ProviderAdapter>>,
}

impl ProviderRegistry {
    /// Creates the registry. No adapter is built yet.
    pub fn new(config: PaymentConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| PaymentError::network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            stripe: OnceCell::new(),
            lemonsqueezy: OnceCell::new(),
            polar: OnceCell::new(),
            creem: OnceCell::new(),
            chargebee: OnceCell::new(),
        })
    }

    fn slot(&self, kind: ProviderKind) -> &OnceCell<Arc<ProviderAdapter>> {
        match kind {
            ProviderKind::Stripe => &self.stripe,
            ProviderKind::LemonSqueezy => &self.lemonsqueezy,
            ProviderKind::Polar => &self.polar,
            ProviderKind::Creem => &self.creem,
            ProviderKind::Chargebee => &self.chargebee,
        }
    }

    /// Returns the adapter for `kind`, building it on first use.
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<ProviderAdapter>, PaymentError> {
        self.slot(kind)
            .get_or_try_init(|| {
                let adapter = self.build(kind).map_err(|e| {
                    tracing::warn!(provider = %kind, error = %e, "Payment provider not configured");
                    e
                })?;
                tracing::info!(provider = %kind, "Payment provider initialised");
                Ok(Arc::new(adapter))
            })
            .cloned()
    }

    fn build(&self, kind: ProviderKind) -> Result<ProviderAdapter, PaymentError> {
        let client = self.http_client.clone();
        let payment = &self.config;

        Ok(match kind {
            ProviderKind::Stripe => ProviderAdapter::Stripe(StripeAdapter::new(
                StripeConfig::from_settings(&payment.stripe)?,
                client,
            )),
            ProviderKind::LemonSqueezy => ProviderAdapter::LemonSqueezy(LemonSqueezyAdapter::new(
                LemonSqueezyConfig::from_settings(&payment.lemonsqueezy)?,
                client,
            )),
            ProviderKind::Polar => ProviderAdapter::Polar(PolarAdapter::new(
                PolarConfig::from_settings(&payment.polar)?,
                client,
            )),
            ProviderKind::Creem => ProviderAdapter::Creem(CreemAdapter::new(
                CreemConfig::from_settings(&payment.creem)?,
                client,
            )),
            ProviderKind::Chargebee => ProviderAdapter::Chargebee(ChargebeeAdapter::new(
                ChargebeeConfig::from_settings(&payment.chargebee)?,
                client,
            )),
        })
    }
}

impl PaymentProviderResolver for ProviderRegistry {
    fn resolve(&self, kind: ProviderKind) -> Result<Arc<dyn PaymentProvider>, PaymentError> {
        let adapter: Arc<dyn PaymentProvider> = self.get(kind)?;
        Ok(adapter)
    }
}
