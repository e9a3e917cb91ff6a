//! Lemon Squeezy payment provider adapter.
//!
//! Webhooks carry `X-Signature`, a hex HMAC-SHA256 of the raw body keyed
//! with the signing secret. The event name lives in `meta.event_name` and
//! checkout custom data comes back in `meta.custom_data`.
//!
//! The REST API speaks JSON:API (`application/vnd.api+json`).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::LemonSqueezySettings;
use crate::domain::purchase::signature::verify_hex_body_signature;
use crate::domain::purchase::{
    BillingEvent, CompletedCheckout, ProviderKind, PurchaseStatus, PurchaseType,
    SubscriptionSnapshot, SubscriptionUpdate, WebhookError,
};
use crate::ports::{
    CheckoutLinkRequest, PaymentError, PaymentProvider, PortalLinkRequest, SeatManagement,
    SubscriptionCancellation, WebhookRequest,
};

use super::common::{
    expect_success, id_string, network_error, owner_from_metadata, parse_body, read_json,
    require_owner, required,
};

const PROVIDER: ProviderKind = ProviderKind::LemonSqueezy;

pub const SIGNATURE_HEADER: &str = "x-signature";

const DEFAULT_API_BASE_URL: &str = "https://api.lemonsqueezy.com";
const JSON_API: &str = "application/vnd.api+json";

/// Custom data key marking what kind of checkout produced an order.
const PURCHASE_TYPE_KEY: &str = "purchase_type";

#[derive(Clone)]
pub struct LemonSqueezyConfig {
    api_key: SecretString,
    webhook_secret: SecretString,
    store_id: String,
    api_base_url: String,
}

impl LemonSqueezyConfig {
    pub fn new(
        api_key: impl Into<String>,
        webhook_secret: impl Into<String>,
        store_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            store_id: store_id.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn from_settings(settings: &LemonSqueezySettings) -> Result<Self, PaymentError> {
        Ok(Self {
            api_key: settings
                .api_key
                .clone()
                .ok_or_else(|| PaymentError::configuration(PROVIDER, "api_key"))?,
            webhook_secret: settings
                .webhook_secret
                .clone()
                .ok_or_else(|| PaymentError::configuration(PROVIDER, "webhook_secret"))?,
            store_id: settings
                .store_id
                .clone()
                .ok_or_else(|| PaymentError::configuration(PROVIDER, "store_id"))?,
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
}

pub struct LemonSqueezyAdapter {
    config: LemonSqueezyConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct LemonSqueezyEvent {
    meta: LemonSqueezyMeta,
    data: LemonSqueezyResource,
}

#[derive(Debug, Deserialize)]
struct LemonSqueezyMeta {
    event_name: String,
    #[serde(default)]
    custom_data: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct LemonSqueezyResource {
    id: Value,
    #[serde(default)]
    attributes: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct LemonSqueezyDocument {
    data: LemonSqueezyResource,
}

impl LemonSqueezyResource {
    fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    fn attr_id(&self, key: &str) -> Option<String> {
        self.attr(key).and_then(id_string)
    }

    fn status(&self) -> Result<PurchaseStatus, WebhookError> {
        let status = self
            .attr("status")
            .and_then(Value::as_str)
            .ok_or(WebhookError::MissingField("data.attributes.status"))?;
        Ok(PurchaseStatus::canonicalize(status))
    }

    fn seats(&self) -> Option<u32> {
        self.attr("first_subscription_item")
            .and_then(|item| item.get("quantity"))
            .and_then(Value::as_u64)
            .and_then(|q| u32::try_from(q).ok())
    }
}

impl LemonSqueezyAdapter {
    pub fn new(config: LemonSqueezyConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, self.url(path))
            .bearer_auth(self.config.api_key.expose_secret())
            .header(reqwest::header::ACCEPT, JSON_API)
            .header(reqwest::header::CONTENT_TYPE, JSON_API)
    }

    async fn get_resource(&self, path: &str) -> Result<LemonSqueezyResource, PaymentError> {
        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;
        let document: LemonSqueezyDocument = read_json(PROVIDER, response).await?;
        Ok(document.data)
    }

    fn verify(&self, request: &WebhookRequest<'_>) -> Result<BillingEvent, WebhookError> {
        let signature = request
            .header(SIGNATURE_HEADER)
            .ok_or(WebhookError::MissingSignature("X-Signature"))?;

        verify_hex_body_signature(
            self.config.webhook_secret.expose_secret().as_bytes(),
            request.body,
            signature,
        )?;

        let event: LemonSqueezyEvent = parse_body(request.body)?;
        tracing::debug!(provider = %PROVIDER, event_type = %event.meta.event_name, "Webhook verified");
        classify(event)
    }
}

fn classify(event: LemonSqueezyEvent) -> Result<BillingEvent, WebhookError> {
    let LemonSqueezyEvent { meta, data } = event;
    let custom = meta.custom_data.as_ref();

    match meta.event_name.as_str() {
        "order_created" => {
            let is_subscription = custom
                .and_then(|c| c.get(PURCHASE_TYPE_KEY))
                .and_then(Value::as_str)
                .map(|t| t.eq_ignore_ascii_case("subscription"))
                .unwrap_or(false);
            if is_subscription {
                return Ok(BillingEvent::ignored(meta.event_name));
            }

            let product_id = data
                .attr("first_order_item")
                .and_then(|item| item.get("variant_id"))
                .and_then(id_string);

            Ok(BillingEvent::OneTimeCompleted(CompletedCheckout {
                order_id: id_string(&data.id),
                customer_id: required(data.attr_id("customer_id"), "data.attributes.customer_id")?,
                product_id: required(product_id, "data.attributes.first_order_item.variant_id")?,
                owner: require_owner(custom)?,
            }))
        }
        "subscription_created" => Ok(BillingEvent::SubscriptionActivated(SubscriptionSnapshot {
            subscription_id: required(id_string(&data.id), "data.id")?,
            customer_id: required(data.attr_id("customer_id"), "data.attributes.customer_id")?,
            product_id: required(data.attr_id("variant_id"), "data.attributes.variant_id")?,
            status: data.status()?,
            seats: data.seats(),
            owner: owner_from_metadata(custom)?,
        })),
        "subscription_updated"
        | "subscription_cancelled"
        | "subscription_resumed"
        | "subscription_paused"
        | "subscription_unpaused" => Ok(BillingEvent::SubscriptionUpdated(SubscriptionUpdate {
            subscription_id: required(id_string(&data.id), "data.id")?,
            status: data.status()?,
            product_id: data.attr_id("variant_id"),
            seats: data.seats(),
        })),
        "subscription_expired" => Ok(BillingEvent::terminated(required(
            id_string(&data.id),
            "data.id",
        )?)),
        _ => Ok(BillingEvent::ignored(meta.event_name)),
    }
}

#[async_trait]
impl PaymentProvider for LemonSqueezyAdapter {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    async fn create_checkout_link(
        &self,
        request: CheckoutLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        let mut custom = Map::new();
        custom.insert(
            request.owner.metadata_key().to_string(),
            Value::String(request.owner.id().to_string()),
        );
        custom.insert(
            PURCHASE_TYPE_KEY.to_string(),
            Value::String(match request.purchase_type {
                PurchaseType::OneTime => "one_time".to_string(),
                PurchaseType::Subscription => "subscription".to_string(),
            }),
        );

        let mut checkout_data = json!({ "custom": custom });
        if let Some(email) = &request.email {
            checkout_data["email"] = json!(email);
        }
        if let Some(name) = &request.name {
            checkout_data["name"] = json!(name);
        }
        if let Some(seats) = request.seats {
            checkout_data["variant_quantities"] = json!([{
                "variant_id": request.product_id.parse::<u64>().ok(),
                "quantity": seats,
            }]);
        }

        let body = json!({
            "data": {
                "type": "checkouts",
                "attributes": {
                    "checkout_data": checkout_data,
                    "product_options": { "redirect_url": request.redirect_url },
                },
                "relationships": {
                    "store": { "data": { "type": "stores", "id": self.config.store_id } },
                    "variant": { "data": { "type": "variants", "id": request.product_id } },
                },
            }
        });

        let response = self
            .request(reqwest::Method::POST, "checkouts")
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        let document: LemonSqueezyDocument = read_json(PROVIDER, response).await?;
        Ok(document
            .data
            .attr("url")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn create_customer_portal_link(
        &self,
        request: PortalLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        // Portal URLs are pre-signed on the customer resource.
        let customer = self
            .get_resource(&format!("customers/{}", request.customer_id))
            .await?;

        Ok(customer
            .attr("urls")
            .and_then(|urls| urls.get("customer_portal"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn verify_webhook(&self, request: &WebhookRequest<'_>) -> Result<BillingEvent, WebhookError> {
        self.verify(request)
    }

    fn seat_management(&self) -> Option<&dyn SeatManagement> {
        Some(self)
    }

    fn cancellation(&self) -> Option<&dyn SubscriptionCancellation> {
        Some(self)
    }
}

#[async_trait]
impl SeatManagement for LemonSqueezyAdapter {
    async fn set_subscription_seats(&self, subscription_id: &str, seats: u32) -> Result<(), PaymentError> {
        let subscription = self
            .get_resource(&format!("subscriptions/{}", subscription_id))
            .await?;
        let item_id = subscription
            .attr("first_subscription_item")
            .and_then(|item| item.get("id"))
            .and_then(id_string)
            .ok_or_else(|| PaymentError::not_found("subscription item"))?;

        let body = json!({
            "data": {
                "type": "subscription-items",
                "id": item_id,
                "attributes": { "quantity": seats },
            }
        });

        let response = self
            .request(reqwest::Method::PATCH, &format!("subscription-items/{}", item_id))
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        expect_success(PROVIDER, response).await
    }
}

#[async_trait]
impl SubscriptionCancellation for LemonSqueezyAdapter {
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), PaymentError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("subscriptions/{}", subscription_id))
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        expect_success(PROVIDER, response).await
    }
}
