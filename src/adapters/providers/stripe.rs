//! Stripe payment provider adapter.
//!
//! # Security
//!
//! - `Stripe-Signature: t=<unix>,v1=<hex>` verified with HMAC-SHA256 over
//!   `"<t>.<body>"` and constant-time comparison
//! - Timestamp validation (5-minute window, 1-minute future skew)
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key, webhook_secret);
//! let adapter = StripeAdapter::new(config, reqwest::Client::new());
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::StripeSettings;
use crate::domain::purchase::signature::{constant_time_eq, hmac_sha256, validate_timestamp};
use crate::domain::purchase::{
    BillingEvent, CompletedCheckout, ProviderKind, PurchaseStatus, PurchaseType,
    SubscriptionSnapshot, SubscriptionUpdate, WebhookError,
};
use crate::ports::{
    CheckoutLinkRequest, PaymentError, PaymentProvider, PortalLinkRequest, SeatManagement,
    SubscriptionCancellation, WebhookRequest,
};

use super::common::{
    expect_success, network_error, owner_from_metadata, parse_body, parse_object, read_json,
    require_owner, required,
};

const PROVIDER: ProviderKind = ProviderKind::Stripe;

/// Header carrying the Stripe webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    /// Base URL for Stripe API.
    api_base_url: String,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Build from loaded settings, failing on the first missing value.
    pub fn from_settings(settings: &StripeSettings) -> Result<Self, PaymentError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| PaymentError::configuration(PROVIDER, "api_key"))?;
        let webhook_secret = settings
            .webhook_secret
            .clone()
            .ok_or_else(|| PaymentError::configuration(PROVIDER, "webhook_secret"))?;

        Ok(Self {
            api_key,
            webhook_secret,
            api_base_url: settings
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        })
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Parsed `Stripe-Signature` header.
///
/// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>...][,v0=<legacy>]`.
/// Several `v1` entries appear while a signing secret is being rolled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or(WebhookError::MissingSignature("invalid Stripe-Signature format"))?;

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| WebhookError::InvalidTimestamp)?,
                    );
                }
                "v1" => {
                    v1_signatures.push(
                        hex::decode(value.trim())
                            .map_err(|_| WebhookError::MissingSignature("invalid v1 signature hex"))?,
                    );
                }
                _ => {
                    // Ignore v0 and unknown fields for forward compatibility
                }
            }
        }

        let timestamp = timestamp.ok_or(WebhookError::MissingSignature("missing timestamp"))?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::MissingSignature("missing v1 signature"));
        }

        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }
}

/// Stripe payment provider adapter.
pub struct StripeAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

// ════════════════════════════════════════════════════════════════════════════════
// Payload types
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: Value,
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    mode: String,
    customer: Option<String>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct StripeSubscription {
    id: String,
    customer: String,
    status: String,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
    items: StripeList<StripeSubscriptionItem>,
}

#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StripeSubscriptionItem {
    id: String,
    price: StripePrice,
    quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StripePrice {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeUrlResponse {
    url: Option<String>,
}

impl StripeSubscription {
    fn first_item(&self) -> Result<&StripeSubscriptionItem, WebhookError> {
        required(self.items.data.first(), "data.object.items.data[0]")
    }
}

impl StripeAdapter {
    /// Create a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base_url, path)
    }

    /// Verify against an explicit clock; `verify_webhook` passes the current time.
    pub fn verify_at(&self, request: &WebhookRequest<'_>, now: i64) -> Result<BillingEvent, WebhookError> {
        let header = request
            .header(SIGNATURE_HEADER)
            .ok_or(WebhookError::MissingSignature("Stripe-Signature"))?;
        let header = SignatureHeader::parse(header)?;

        if let Err(e) = validate_timestamp(header.timestamp, now) {
            tracing::warn!(
                provider = %PROVIDER,
                timestamp = header.timestamp,
                now,
                "Webhook timestamp outside tolerance"
            );
            return Err(e);
        }

        let expected = hmac_sha256(
            self.config.webhook_secret.expose_secret().as_bytes(),
            &[header.timestamp.to_string().as_bytes(), b".", request.body],
        )?;

        if !header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_eq(&expected, candidate))
        {
            return Err(WebhookError::InvalidSignature);
        }

        let event: StripeEvent = parse_body(request.body)?;
        tracing::debug!(provider = %PROVIDER, event_id = %event.id, event_type = %event.event_type, "Webhook verified");
        classify(event)
    }

    async fn get_subscription(&self, subscription_id: &str) -> Result<StripeSubscription, PaymentError> {
        let response = self
            .http_client
            .get(self.url(&format!("subscriptions/{}", subscription_id)))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        read_json(PROVIDER, response).await
    }
}

fn classify(event: StripeEvent) -> Result<BillingEvent, WebhookError> {
    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let session: StripeCheckoutSession = parse_object(event.data.object)?;
            if session.mode != "payment" {
                // Subscription checkouts are recorded from the subscription events.
                return Ok(BillingEvent::ignored(event.event_type));
            }
            let metadata = session.metadata.as_ref();
            let product_id = metadata
                .and_then(|m| m.get("product_id"))
                .and_then(Value::as_str)
                .map(str::to_string);

            Ok(BillingEvent::OneTimeCompleted(CompletedCheckout {
                order_id: Some(session.id),
                customer_id: required(session.customer, "data.object.customer")?,
                product_id: required(product_id, "data.object.metadata.product_id")?,
                owner: require_owner(metadata)?,
            }))
        }
        "customer.subscription.created" => {
            let subscription: StripeSubscription = parse_object(event.data.object)?;
            let item = subscription.first_item()?;

            Ok(BillingEvent::SubscriptionActivated(SubscriptionSnapshot {
                product_id: item.price.id.clone(),
                seats: item.quantity,
                owner: owner_from_metadata(subscription.metadata.as_ref())?,
                status: PurchaseStatus::canonicalize(&subscription.status),
                customer_id: subscription.customer,
                subscription_id: subscription.id,
            }))
        }
        "customer.subscription.updated"
        | "customer.subscription.paused"
        | "customer.subscription.resumed" => {
            let subscription: StripeSubscription = parse_object(event.data.object)?;
            let item = subscription.items.data.first();

            Ok(BillingEvent::SubscriptionUpdated(SubscriptionUpdate {
                product_id: item.map(|i| i.price.id.clone()),
                seats: item.and_then(|i| i.quantity),
                status: PurchaseStatus::canonicalize(&subscription.status),
                subscription_id: subscription.id,
            }))
        }
        "customer.subscription.deleted" => {
            let subscription: StripeSubscription = parse_object(event.data.object)?;
            Ok(BillingEvent::terminated(subscription.id))
        }
        _ => Ok(BillingEvent::ignored(event.event_type)),
    }
}

#[async_trait]
impl PaymentProvider for StripeAdapter {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    async fn create_checkout_link(
        &self,
        request: CheckoutLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        let owner_key = format!("metadata[{}]", request.owner.metadata_key());
        let quantity = request.seats.unwrap_or(1).to_string();

        let mut params: Vec<(String, String)> = vec![
            ("line_items[0][price]".into(), request.product_id.clone()),
            ("line_items[0][quantity]".into(), quantity),
            ("success_url".into(), request.redirect_url.clone()),
            ("cancel_url".into(), request.redirect_url),
            (owner_key, request.owner.id().to_string()),
            ("metadata[product_id]".into(), request.product_id),
        ];

        match request.purchase_type {
            PurchaseType::OneTime => {
                params.push(("mode".into(), "payment".into()));
                if request.customer_id.is_none() {
                    params.push(("customer_creation".into(), "always".into()));
                }
            }
            PurchaseType::Subscription => {
                params.push(("mode".into(), "subscription".into()));
                params.push((
                    format!("subscription_data[metadata][{}]", request.owner.metadata_key()),
                    request.owner.id().to_string(),
                ));
                if let Some(days) = request.trial_period_days {
                    params.push(("subscription_data[trial_period_days]".into(), days.to_string()));
                }
            }
        }

        match (request.customer_id, request.email) {
            (Some(customer), _) => params.push(("customer".into(), customer)),
            (None, Some(email)) => params.push(("customer_email".into(), email)),
            (None, None) => {}
        }

        let response = self
            .http_client
            .post(self.url("checkout/sessions"))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        let session: StripeUrlResponse = read_json(PROVIDER, response).await?;
        Ok(session.url)
    }

    async fn create_customer_portal_link(
        &self,
        request: PortalLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        let mut params = vec![("customer", request.customer_id)];
        if let Some(return_url) = request.redirect_url {
            params.push(("return_url", return_url));
        }

        let response = self
            .http_client
            .post(self.url("billing_portal/sessions"))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        let portal: StripeUrlResponse = read_json(PROVIDER, response).await?;
        Ok(portal.url)
    }

    async fn verify_webhook(&self, request: &WebhookRequest<'_>) -> Result<BillingEvent, WebhookError> {
        self.verify_at(request, chrono::Utc::now().timestamp())
    }

    fn seat_management(&self) -> Option<&dyn SeatManagement> {
        Some(self)
    }

    fn cancellation(&self) -> Option<&dyn SubscriptionCancellation> {
        Some(self)
    }
}

#[async_trait]
impl SeatManagement for StripeAdapter {
    async fn set_subscription_seats(&self, subscription_id: &str, seats: u32) -> Result<(), PaymentError> {
        let subscription = self.get_subscription(subscription_id).await?;
        let item = subscription
            .items
            .data
            .first()
            .ok_or_else(|| PaymentError::not_found("subscription item"))?;

        let response = self
            .http_client
            .post(self.url(&format!("subscriptions/{}", subscription_id)))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&[
                ("items[0][id]", item.id.clone()),
                ("items[0][quantity]", seats.to_string()),
            ])
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        expect_success(PROVIDER, response).await
    }
}

#[async_trait]
impl SubscriptionCancellation for StripeAdapter {
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), PaymentError> {
        let response = self
            .http_client
            .delete(self.url(&format!("subscriptions/{}", subscription_id)))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        expect_success(PROVIDER, response).await
    }
}
