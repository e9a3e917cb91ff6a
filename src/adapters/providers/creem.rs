//! Creem payment provider adapter.
//!
//! Webhooks carry `creem-signature`, a hex HMAC-SHA256 of the raw body.
//! Envelopes are `{ "eventType": ..., "object": { ... } }` where nested
//! references (customer, product, order) are either ids or expanded objects.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::CreemSettings;
use crate::domain::purchase::signature::verify_hex_body_signature;
use crate::domain::purchase::{
    BillingEvent, CompletedCheckout, ProviderKind, PurchaseStatus, SubscriptionSnapshot,
    SubscriptionUpdate, WebhookError,
};
use crate::ports::{
    CheckoutLinkRequest, PaymentError, PaymentProvider, PortalLinkRequest,
    SubscriptionCancellation, WebhookRequest,
};

use super::common::{
    expect_success, id_string, metadata_map, network_error, owner_from_metadata, parse_body,
    read_json, reference_id, require_owner, required,
};

const PROVIDER: ProviderKind = ProviderKind::Creem;

pub const SIGNATURE_HEADER: &str = "creem-signature";

const DEFAULT_API_BASE_URL: &str = "https://api.creem.io";
const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct CreemConfig {
    api_key: SecretString,
    webhook_secret: SecretString,
    api_base_url: String,
}

impl CreemConfig {
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn from_settings(settings: &CreemSettings) -> Result<Self, PaymentError> {
        Ok(Self {
            api_key: settings
                .api_key
                .clone()
                .ok_or_else(|| PaymentError::configuration(PROVIDER, "api_key"))?,
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
}

pub struct CreemAdapter {
    config: CreemConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CreemEvent {
    #[serde(rename = "eventType")]
    event_type: String,
    object: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CreemCheckoutResponse {
    checkout_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreemBillingResponse {
    customer_portal_link: Option<String>,
}

/// Accessors over a Creem event object.
struct CreemObject(Map<String, Value>);

impl CreemObject {
    fn reference(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(reference_id)
    }

    fn id(&self) -> Option<String> {
        self.0.get("id").and_then(id_string)
    }

    fn metadata(&self) -> Option<Map<String, Value>> {
        metadata_map(self.0.get("metadata"))
    }

    fn status(&self) -> Result<PurchaseStatus, WebhookError> {
        let status = self
            .0
            .get("status")
            .and_then(Value::as_str)
            .ok_or(WebhookError::MissingField("object.status"))?;
        Ok(PurchaseStatus::canonicalize(status))
    }

    fn units(&self) -> Option<u32> {
        self.0
            .get("items")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(|item| item.get("units"))
            .and_then(Value::as_u64)
            .and_then(|u| u32::try_from(u).ok())
    }

    fn has_subscription(&self) -> bool {
        matches!(self.0.get("subscription"), Some(v) if !v.is_null())
    }
}

impl CreemAdapter {
    pub fn new(config: CreemConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base_url, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .post(self.url(path))
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
    }

    fn verify(&self, request: &WebhookRequest<'_>) -> Result<BillingEvent, WebhookError> {
        let signature = request
            .header(SIGNATURE_HEADER)
            .ok_or(WebhookError::MissingSignature("creem-signature"))?;

        verify_hex_body_signature(
            self.config.webhook_secret.expose_secret().as_bytes(),
            request.body,
            signature,
        )?;

        let event: CreemEvent = parse_body(request.body)?;
        tracing::debug!(provider = %PROVIDER, event_type = %event.event_type, "Webhook verified");
        classify(event)
    }
}

fn classify(event: CreemEvent) -> Result<BillingEvent, WebhookError> {
    let object = CreemObject(event.object);

    match event.event_type.as_str() {
        "checkout.completed" => {
            if object.has_subscription() {
                return Ok(BillingEvent::ignored(event.event_type));
            }
            let order_id = object.reference("order").or_else(|| object.id());
            let metadata = object.metadata();

            Ok(BillingEvent::OneTimeCompleted(CompletedCheckout {
                order_id,
                customer_id: required(object.reference("customer"), "object.customer")?,
                product_id: required(object.reference("product"), "object.product")?,
                owner: require_owner(metadata.as_ref())?,
            }))
        }
        "subscription.active" => {
            let metadata = object.metadata();
            Ok(BillingEvent::SubscriptionActivated(SubscriptionSnapshot {
                subscription_id: required(object.id(), "object.id")?,
                customer_id: required(object.reference("customer"), "object.customer")?,
                product_id: required(object.reference("product"), "object.product")?,
                status: object.status()?,
                seats: object.units(),
                owner: owner_from_metadata(metadata.as_ref())?,
            }))
        }
        "subscription.updated"
        | "subscription.trialing"
        | "subscription.paid"
        | "subscription.past_due"
        | "subscription.paused"
        | "subscription.scheduled_cancel" => {
            Ok(BillingEvent::SubscriptionUpdated(SubscriptionUpdate {
                subscription_id: required(object.id(), "object.id")?,
                status: object.status()?,
                product_id: object.reference("product"),
                seats: object.units(),
            }))
        }
        "subscription.canceled" | "subscription.expired" => Ok(BillingEvent::terminated(
            required(object.id(), "object.id")?,
        )),
        _ => Ok(BillingEvent::ignored(event.event_type)),
    }
}

#[async_trait]
impl PaymentProvider for CreemAdapter {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    async fn create_checkout_link(
        &self,
        request: CheckoutLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        let mut body = json!({
            "product_id": request.product_id,
            "success_url": request.redirect_url,
            "metadata": { request.owner.metadata_key(): request.owner.id() },
        });
        // Creem identifies the buyer by id or email only.
        let mut customer = Map::new();
        if let Some(id) = request.customer_id {
            customer.insert("id".to_string(), json!(id));
        }
        if let Some(email) = request.email {
            customer.insert("email".to_string(), json!(email));
        }
        if !customer.is_empty() {
            body["customer"] = Value::Object(customer);
        }
        if let Some(units) = request.seats {
            body["units"] = json!(units);
        }

        let response = self
            .post("checkouts")
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        let checkout: CreemCheckoutResponse = read_json(PROVIDER, response).await?;
        Ok(checkout.checkout_url)
    }

    async fn create_customer_portal_link(
        &self,
        request: PortalLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        let response = self
            .post("customers/billing")
            .json(&json!({ "customer_id": request.customer_id }))
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        let billing: CreemBillingResponse = read_json(PROVIDER, response).await?;
        Ok(billing.customer_portal_link)
    }

    async fn verify_webhook(&self, request: &WebhookRequest<'_>) -> Result<BillingEvent, WebhookError> {
        self.verify(request)
    }

    fn cancellation(&self) -> Option<&dyn SubscriptionCancellation> {
        Some(self)
    }
}

#[async_trait]
impl SubscriptionCancellation for CreemAdapter {
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), PaymentError> {
        let response = self
            .post(&format!("subscriptions/{}/cancel", subscription_id))
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        expect_success(PROVIDER, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::providers::test_server::FakeApi;
    use crate::domain::purchase::signature::hmac_sha256;
    use crate::domain::purchase::{OwnerRef, PurchaseType};
    use axum::http::{HeaderMap, Method, StatusCode};

    const SECRET: &str = "creem_whsec_test";

    fn adapter() -> CreemAdapter {
        CreemAdapter::new(CreemConfig::new("creem_key", SECRET), reqwest::Client::new())
    }

    async fn verify(body: &str) -> Result<BillingEvent, WebhookError> {
        let mac = hmac_sha256(SECRET.as_bytes(), &[body.as_bytes()]).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("creem-signature", hex::encode(mac).parse().unwrap());
        adapter()
            .verify_webhook(&WebhookRequest::new(&headers, body.as_bytes()))
            .await
    }

    #[tokio::test]
    async fn one_time_checkout_with_expanded_references() {
        let body = json!({
            "id": "evt_1",
            "eventType": "checkout.completed",
            "object": {
                "id": "ch_1",
                "order": {"id": "ord_1", "amount": 1000},
                "customer": {"id": "cust_1", "email": "a@example.com"},
                "product": {"id": "p_123", "name": "Lifetime"},
                "metadata": {"organization_id": "org_1"}
            }
        })
        .to_string();

        match verify(&body).await.unwrap() {
            BillingEvent::OneTimeCompleted(checkout) => {
                assert_eq!(checkout.order_id.as_deref(), Some("ord_1"));
                assert_eq!(checkout.customer_id, "cust_1");
                assert_eq!(checkout.product_id, "p_123");
                assert_eq!(checkout.owner, OwnerRef::organization("org_1").unwrap());
            }
            other => panic!("Expected one-time purchase, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn checkout_without_order_falls_back_to_checkout_id() {
        let body = json!({
            "eventType": "checkout.completed",
            "object": {
                "id": "ch_2",
                "customer": "cust_1",
                "product": "p_123",
                "metadata": {"user_id": "usr_1"}
            }
        })
        .to_string();

        match verify(&body).await.unwrap() {
            BillingEvent::OneTimeCompleted(checkout) => {
                assert_eq!(checkout.order_id.as_deref(), Some("ch_2"));
            }
            other => panic!("Expected one-time purchase, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn subscription_checkout_is_ignored() {
        let body = json!({
            "eventType": "checkout.completed",
            "object": {"id": "ch_3", "subscription": {"id": "sub_1"}}
        })
        .to_string();

        assert!(matches!(verify(&body).await.unwrap(), BillingEvent::Ignored { .. }));
    }

    #[tokio::test]
    async fn subscription_active_is_activation() {
        let body = json!({
            "eventType": "subscription.active",
            "object": {
                "id": "sub_1",
                "status": "active",
                "customer": {"id": "cust_1"},
                "product": {"id": "p_sub"},
                "items": [{"id": "sitem_1", "units": 4}],
                "metadata": {"organization_id": "org_1"}
            }
        })
        .to_string();

        match verify(&body).await.unwrap() {
            BillingEvent::SubscriptionActivated(snapshot) => {
                assert_eq!(snapshot.subscription_id, "sub_1");
                assert_eq!(snapshot.product_id, "p_sub");
                assert_eq!(snapshot.seats, Some(4));
            }
            other => panic!("Expected activation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn scheduled_cancel_keeps_access() {
        let body = json!({
            "eventType": "subscription.scheduled_cancel",
            "object": {"id": "sub_1", "status": "scheduled_cancel"}
        })
        .to_string();

        assert!(matches!(
            verify(&body).await.unwrap(),
            BillingEvent::SubscriptionUpdated(SubscriptionUpdate { status: PurchaseStatus::Active, .. })
        ));
    }

    #[tokio::test]
    async fn expired_is_termination() {
        let body = json!({"eventType": "subscription.expired", "object": {"id": "sub_1"}}).to_string();
        assert_eq!(verify(&body).await.unwrap(), BillingEvent::terminated("sub_1"));
    }

    #[tokio::test]
    async fn non_hex_signature_is_bad_request() {
        let mut headers = HeaderMap::new();
        headers.insert("creem-signature", "not-hex".parse().unwrap());
        let err = adapter()
            .verify_webhook(&WebhookRequest::new(&headers, b"{}"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    fn adapter_for(api: &FakeApi) -> CreemAdapter {
        CreemAdapter::new(
            CreemConfig::new("creem_key", SECRET).with_base_url(api.base_url.clone()),
            reqwest::Client::new(),
        )
    }

    #[tokio::test]
    async fn checkout_uses_api_key_header() {
        let api = FakeApi::start(vec![(
            Method::POST,
            "/v1/checkouts",
            200,
            json!({"id": "ch_1", "checkout_url": "https://checkout.creem.io/ch_1"}),
        )])
        .await;

        let url = adapter_for(&api)
            .create_checkout_link(CheckoutLinkRequest {
                purchase_type: PurchaseType::OneTime,
                product_id: "p_123".into(),
                redirect_url: "https://app.example.com/thanks".into(),
                email: Some("buyer@example.com".into()),
                name: None,
                owner: OwnerRef::organization("org_1").unwrap(),
                seats: None,
                customer_id: None,
                trial_period_days: None,
            })
            .await
            .unwrap();

        assert_eq!(url.as_deref(), Some("https://checkout.creem.io/ch_1"));
        let request = api.only_request();
        assert_eq!(request.headers.get("x-api-key").unwrap(), "creem_key");
        assert_eq!(request.json()["metadata"]["organization_id"], "org_1");
        assert_eq!(request.json()["customer"]["email"], "buyer@example.com");
    }

    #[tokio::test]
    async fn checkout_passes_existing_customer_id() {
        let api = FakeApi::start(vec![(
            Method::POST,
            "/v1/checkouts",
            200,
            json!({"id": "ch_2", "checkout_url": "https://checkout.creem.io/ch_2"}),
        )])
        .await;

        adapter_for(&api)
            .create_checkout_link(CheckoutLinkRequest {
                purchase_type: PurchaseType::Subscription,
                product_id: "p_team".into(),
                redirect_url: "https://app.example.com/thanks".into(),
                email: None,
                name: Some("Ada".into()),
                owner: OwnerRef::user("usr_1").unwrap(),
                seats: Some(3),
                customer_id: Some("cust_42".into()),
                trial_period_days: None,
            })
            .await
            .unwrap();

        let body = api.only_request().json();
        assert_eq!(body["customer"]["id"], "cust_42");
        assert!(body["customer"].get("email").is_none());
        assert_eq!(body["units"], 3);
    }

    #[tokio::test]
    async fn cancel_posts_to_cancel_endpoint() {
        let api = FakeApi::start(vec![(
            Method::POST,
            "/v1/subscriptions/sub_1/cancel",
            200,
            json!({"id": "sub_1", "status": "canceled"}),
        )])
        .await;

        adapter_for(&api).cancel_subscription("sub_1").await.unwrap();
        assert_eq!(api.only_request().path, "/v1/subscriptions/sub_1/cancel");
    }

    #[tokio::test]
    async fn portal_failure_maps_status() {
        let api = FakeApi::start(vec![(
            Method::POST,
            "/v1/customers/billing",
            404,
            json!({"message": "customer not found"}),
        )])
        .await;

        let err = adapter_for(&api)
            .create_customer_portal_link(PortalLinkRequest {
                customer_id: "cust_x".into(),
                redirect_url: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::ports::PaymentErrorCode::NotFound);
    }
}
