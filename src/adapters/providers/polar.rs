//! Polar payment provider adapter.
//!
//! Polar signs webhooks with the Standard Webhooks scheme:
//!
//! - `webhook-id`, `webhook-timestamp` and `webhook-signature` headers
//! - signed content is `"<id>.<timestamp>.<body>"`
//! - `webhook-signature` holds space-separated `v1,<base64>` entries
//! - secrets prefixed `whsec_` are base64 keys, anything else is used as raw bytes
//!
//! Polar expects `202 Accepted` on successful delivery.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::PolarSettings;
use crate::domain::purchase::signature::{
    constant_time_eq, hmac_sha256, validate_timestamp_symmetric, STANDARD_WEBHOOK_TOLERANCE_SECS,
};
use crate::domain::purchase::{
    BillingEvent, CompletedCheckout, ProviderKind, PurchaseStatus, SubscriptionSnapshot,
    SubscriptionUpdate, WebhookError,
};
use crate::ports::{
    CheckoutLinkRequest, PaymentError, PaymentProvider, PortalLinkRequest,
    SubscriptionCancellation, WebhookRequest,
};

use super::common::{
    expect_success, network_error, owner_from_metadata, parse_body, parse_object, read_json,
    require_owner, required,
};

const PROVIDER: ProviderKind = ProviderKind::Polar;

pub const ID_HEADER: &str = "webhook-id";
pub const TIMESTAMP_HEADER: &str = "webhook-timestamp";
pub const SIGNATURE_HEADER: &str = "webhook-signature";

const DEFAULT_API_BASE_URL: &str = "https://api.polar.sh";
const SECRET_PREFIX: &str = "whsec_";

#[derive(Clone)]
pub struct PolarConfig {
    access_token: SecretString,
    webhook_secret: SecretString,
    api_base_url: String,
}

impl PolarConfig {
    pub fn new(access_token: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::new(access_token.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn from_settings(settings: &PolarSettings) -> Result<Self, PaymentError> {
        Ok(Self {
            access_token: settings
                .access_token
                .clone()
                .ok_or_else(|| PaymentError::configuration(PROVIDER, "access_token"))?,
            webhook_secret: settings
                .webhook_secret
                .clone()
                .ok_or_else(|| PaymentError::configuration(PROVIDER, "webhook_secret"))?,
            api_base_url: settings
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// HMAC key bytes for the configured secret.
    fn signing_key(&self) -> Result<Vec<u8>, WebhookError> {
        let secret = self.webhook_secret.expose_secret();
        match secret.strip_prefix(SECRET_PREFIX) {
            Some(encoded) => BASE64
                .decode(encoded)
                .map_err(|_| WebhookError::Configuration("polar webhook secret is not valid base64".into())),
            None => Ok(secret.as_bytes().to_vec()),
        }
    }
}

pub struct PolarAdapter {
    config: PolarConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PolarEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct PolarOrder {
    id: String,
    customer_id: String,
    product_id: Option<String>,
    billing_reason: Option<String>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct PolarSubscription {
    id: String,
    customer_id: Option<String>,
    product_id: Option<String>,
    status: String,
    seats: Option<u32>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct PolarCheckoutResponse {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PolarCustomerSession {
    customer_portal_url: Option<String>,
}

impl PolarAdapter {
    pub fn new(config: PolarConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base_url, path)
    }

    pub fn verify_at(&self, request: &WebhookRequest<'_>, now: i64) -> Result<BillingEvent, WebhookError> {
        let id = request
            .header(ID_HEADER)
            .ok_or(WebhookError::MissingSignature("webhook-id"))?;
        let timestamp_raw = request
            .header(TIMESTAMP_HEADER)
            .ok_or(WebhookError::MissingSignature("webhook-timestamp"))?;
        let signatures = request
            .header(SIGNATURE_HEADER)
            .ok_or(WebhookError::MissingSignature("webhook-signature"))?;

        let timestamp: i64 = timestamp_raw
            .trim()
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;
        validate_timestamp_symmetric(timestamp, now, STANDARD_WEBHOOK_TOLERANCE_SECS)?;

        let expected = hmac_sha256(
            &self.config.signing_key()?,
            &[id.as_bytes(), b".", timestamp_raw.trim().as_bytes(), b".", request.body],
        )?;

        let mut saw_v1 = false;
        let mut matched = false;
        for entry in signatures.split_whitespace() {
            let Some(encoded) = entry.strip_prefix("v1,") else {
                continue;
            };
            saw_v1 = true;
            if let Ok(candidate) = BASE64.decode(encoded) {
                matched |= constant_time_eq(&expected, &candidate);
            }
        }

        if !saw_v1 {
            return Err(WebhookError::MissingSignature("no v1 entry in webhook-signature"));
        }
        if !matched {
            return Err(WebhookError::InvalidSignature);
        }

        let event: PolarEvent = parse_body(request.body)?;
        tracing::debug!(provider = %PROVIDER, webhook_id = %id, event_type = %event.event_type, "Webhook verified");
        classify(event)
    }
}

fn classify(event: PolarEvent) -> Result<BillingEvent, WebhookError> {
    match event.event_type.as_str() {
        "order.created" => {
            let order: PolarOrder = parse_object(event.data)?;
            // Renewals and plan changes also create orders.
            if order.billing_reason.as_deref() != Some("purchase") {
                return Ok(BillingEvent::ignored(event.event_type));
            }
            Ok(BillingEvent::OneTimeCompleted(CompletedCheckout {
                owner: require_owner(order.metadata.as_ref())?,
                order_id: Some(order.id),
                customer_id: order.customer_id,
                product_id: required(order.product_id, "data.product_id")?,
            }))
        }
        "subscription.created" | "subscription.active" => {
            let subscription: PolarSubscription = parse_object(event.data)?;
            Ok(BillingEvent::SubscriptionActivated(SubscriptionSnapshot {
                owner: owner_from_metadata(subscription.metadata.as_ref())?,
                status: PurchaseStatus::canonicalize(&subscription.status),
                subscription_id: subscription.id,
                customer_id: required(subscription.customer_id, "data.customer_id")?,
                product_id: required(subscription.product_id, "data.product_id")?,
                seats: subscription.seats,
            }))
        }
        "subscription.updated" | "subscription.canceled" | "subscription.uncanceled" => {
            let subscription: PolarSubscription = parse_object(event.data)?;
            Ok(BillingEvent::SubscriptionUpdated(SubscriptionUpdate {
                status: PurchaseStatus::canonicalize(&subscription.status),
                subscription_id: subscription.id,
                product_id: subscription.product_id,
                seats: subscription.seats,
            }))
        }
        "subscription.revoked" => {
            let subscription: PolarSubscription = parse_object(event.data)?;
            Ok(BillingEvent::terminated(subscription.id))
        }
        _ => Ok(BillingEvent::ignored(event.event_type)),
    }
}

#[async_trait]
impl PaymentProvider for PolarAdapter {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    async fn create_checkout_link(
        &self,
        request: CheckoutLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        let mut body = json!({
            "products": [request.product_id],
            "success_url": request.redirect_url,
            "metadata": { request.owner.metadata_key(): request.owner.id() },
        });
        if let Some(email) = request.email {
            body["customer_email"] = json!(email);
        }
        if let Some(name) = request.name {
            body["customer_name"] = json!(name);
        }
        if let Some(customer_id) = request.customer_id {
            body["customer_id"] = json!(customer_id);
        }
        if let Some(seats) = request.seats {
            body["seats"] = json!(seats);
        }

        let response = self
            .http_client
            .post(self.url("checkouts/"))
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        let checkout: PolarCheckoutResponse = read_json(PROVIDER, response).await?;
        Ok(checkout.url)
    }

    async fn create_customer_portal_link(
        &self,
        request: PortalLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        let mut body = json!({ "customer_id": request.customer_id });
        if let Some(return_url) = request.redirect_url {
            body["return_url"] = json!(return_url);
        }

        let response = self
            .http_client
            .post(self.url("customer-sessions/"))
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        let session: PolarCustomerSession = read_json(PROVIDER, response).await?;
        Ok(session.customer_portal_url)
    }

    async fn verify_webhook(&self, request: &WebhookRequest<'_>) -> Result<BillingEvent, WebhookError> {
        self.verify_at(request, chrono::Utc::now().timestamp())
    }

    fn cancellation(&self) -> Option<&dyn SubscriptionCancellation> {
        Some(self)
    }
}

#[async_trait]
impl SubscriptionCancellation for PolarAdapter {
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), PaymentError> {
        let response = self
            .http_client
            .delete(self.url(&format!("subscriptions/{}", subscription_id)))
            .bearer_auth(self.config.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        expect_success(PROVIDER, response).await
    }
}
