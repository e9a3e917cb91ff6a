//! Chargebee payment provider adapter.
//!
//! Chargebee does not sign webhook bodies. Deliveries are authenticated
//! with HTTP Basic credentials configured on the webhook endpoint, which
//! are compared here in constant time.
//!
//! The REST API (`https://<site>.chargebee.com/api/v2`) takes form-encoded
//! bodies and HTTP Basic auth with the API key as username.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::ChargebeeSettings;
use crate::domain::purchase::signature::constant_time_eq;
use crate::domain::purchase::{
    BillingEvent, CompletedCheckout, OwnerRef, ProviderKind, PurchaseStatus, PurchaseType,
    SubscriptionSnapshot, SubscriptionUpdate, WebhookError,
};
use crate::ports::{
    CheckoutLinkRequest, PaymentError, PaymentProvider, PortalLinkRequest, SeatManagement,
    SubscriptionCancellation, WebhookRequest,
};

use super::common::{
    expect_success, metadata_map, network_error, owner_from_metadata, parse_body, read_json,
    require_owner, required,
};

const PROVIDER: ProviderKind = ProviderKind::Chargebee;

const AUTHORIZATION_HEADER: &str = "authorization";

#[derive(Clone)]
pub struct ChargebeeConfig {
    api_key: SecretString,
    webhook_username: String,
    webhook_password: SecretString,
    api_base_url: String,
}

impl ChargebeeConfig {
    pub fn new(
        site: &str,
        api_key: impl Into<String>,
        webhook_username: impl Into<String>,
        webhook_password: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_username: webhook_username.into(),
            webhook_password: SecretString::new(webhook_password.into()),
            api_base_url: site_url(site),
        }
    }

    pub fn from_settings(settings: &ChargebeeSettings) -> Result<Self, PaymentError> {
        let api_base_url = match (&settings.api_base_url, &settings.site) {
            (Some(url), _) => url.clone(),
            (None, Some(site)) => site_url(site),
            (None, None) => return Err(PaymentError::configuration(PROVIDER, "site")),
        };

        Ok(Self {
            api_key: settings
                .api_key
                .clone()
                .ok_or_else(|| PaymentError::configuration(PROVIDER, "api_key"))?,
            webhook_username: settings
                .webhook_username
                .clone()
                .ok_or_else(|| PaymentError::configuration(PROVIDER, "webhook_username"))?,
            webhook_password: settings
                .webhook_password
                .clone()
                .ok_or_else(|| PaymentError::configuration(PROVIDER, "webhook_password"))?,
            api_base_url,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

fn site_url(site: &str) -> String {
    format!("https://{}.chargebee.com/api/v2", site)
}

pub struct ChargebeeAdapter {
    config: ChargebeeConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChargebeeEvent {
    id: Option<String>,
    event_type: String,
    content: ChargebeeContent,
}

#[derive(Debug, Default, Deserialize)]
struct ChargebeeContent {
    subscription: Option<ChargebeeSubscription>,
    customer: Option<ChargebeeCustomer>,
    invoice: Option<ChargebeeInvoice>,
}

#[derive(Debug, Deserialize)]
struct ChargebeeSubscription {
    id: String,
    customer_id: Option<String>,
    status: String,
    #[serde(default)]
    subscription_items: Vec<ChargebeeSubscriptionItem>,
    meta_data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChargebeeSubscriptionItem {
    item_price_id: String,
    quantity: Option<u32>,
    item_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChargebeeCustomer {
    id: String,
    meta_data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChargebeeInvoice {
    id: String,
    customer_id: Option<String>,
    #[serde(default)]
    recurring: bool,
    #[serde(default)]
    line_items: Vec<ChargebeeLineItem>,
}

#[derive(Debug, Deserialize)]
struct ChargebeeLineItem {
    entity_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionEnvelope {
    subscription: ChargebeeSubscription,
}

#[derive(Debug, Deserialize)]
struct CustomerEnvelope {
    customer: ChargebeeCustomer,
}

#[derive(Debug, Deserialize)]
struct HostedPageEnvelope {
    hosted_page: HostedPage,
}

#[derive(Debug, Deserialize)]
struct HostedPage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PortalSessionEnvelope {
    portal_session: PortalSession,
}

#[derive(Debug, Deserialize)]
struct PortalSession {
    access_url: Option<String>,
}

impl ChargebeeSubscription {
    /// The plan line; addons and charges are ignored.
    fn plan_item(&self) -> Option<&ChargebeeSubscriptionItem> {
        self.subscription_items
            .iter()
            .find(|item| item.item_type.as_deref() == Some("plan"))
            .or_else(|| self.subscription_items.first())
    }
}

impl ChargebeeAdapter {
    pub fn new(config: ChargebeeConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base_url, path)
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, PaymentError> {
        let response = self
            .http_client
            .post(self.url(path))
            .basic_auth(self.config.api_key.expose_secret(), Some(""))
            .form(params)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        read_json(PROVIDER, response).await
    }

    /// Checks the Basic credentials on a delivery.
    fn authenticate(&self, request: &WebhookRequest<'_>) -> Result<(), WebhookError> {
        let header = request
            .header(AUTHORIZATION_HEADER)
            .ok_or(WebhookError::MissingSignature("Authorization"))?;
        let encoded = header
            .trim()
            .split_once(' ')
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("basic"))
            .map(|(_, credentials)| credentials)
            .ok_or(WebhookError::MissingSignature("Authorization is not Basic"))?;
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|_| WebhookError::MissingSignature("Authorization is not valid base64"))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| WebhookError::MissingSignature("Authorization is not valid UTF-8"))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or(WebhookError::MissingSignature("Authorization lacks a password"))?;

        let username_ok = constant_time_eq(username.as_bytes(), self.config.webhook_username.as_bytes());
        let password_ok = constant_time_eq(
            password.as_bytes(),
            self.config.webhook_password.expose_secret().as_bytes(),
        );
        if !(username_ok & password_ok) {
            return Err(WebhookError::InvalidSignature);
        }
        Ok(())
    }

    fn verify(&self, request: &WebhookRequest<'_>) -> Result<BillingEvent, WebhookError> {
        self.authenticate(request)?;

        let event: ChargebeeEvent = parse_body(request.body)?;
        tracing::debug!(
            provider = %PROVIDER,
            event_id = event.id.as_deref().unwrap_or("-"),
            event_type = %event.event_type,
            "Webhook verified"
        );
        classify(event)
    }

    /// Ensures the customer carries owner metadata and returns its id.
    async fn prepare_customer(
        &self,
        owner: &OwnerRef,
        customer_id: Option<&str>,
        email: Option<&str>,
    ) -> Result<String, PaymentError> {
        let mut params = vec![("meta_data".to_string(), owner_metadata_json(owner))];
        if let Some(email) = email {
            params.push(("email".to_string(), email.to_string()));
        }

        let path = match customer_id {
            Some(id) => format!("customers/{}", id),
            None => "customers".to_string(),
        };
        let envelope: CustomerEnvelope = self.post_form(&path, &params).await?;
        Ok(envelope.customer.id)
    }

    async fn get_subscription(&self, subscription_id: &str) -> Result<ChargebeeSubscription, PaymentError> {
        let response = self
            .http_client
            .get(self.url(&format!("subscriptions/{}", subscription_id)))
            .basic_auth(self.config.api_key.expose_secret(), Some(""))
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        let envelope: SubscriptionEnvelope = read_json(PROVIDER, response).await?;
        Ok(envelope.subscription)
    }
}

fn owner_metadata_json(owner: &OwnerRef) -> String {
    let mut map = Map::new();
    map.insert(owner.metadata_key().to_string(), Value::String(owner.id().to_string()));
    Value::Object(map).to_string()
}

fn classify(event: ChargebeeEvent) -> Result<BillingEvent, WebhookError> {
    let ChargebeeEvent {
        event_type,
        content,
        ..
    } = event;

    match event_type.as_str() {
        "subscription_created" | "subscription_activated" => {
            let subscription = required(content.subscription, "content.subscription")?;
            let metadata = metadata_map(subscription.meta_data.as_ref()).or_else(|| {
                content
                    .customer
                    .as_ref()
                    .and_then(|c| metadata_map(c.meta_data.as_ref()))
            });
            let item = required(subscription.plan_item(), "content.subscription.subscription_items")?;

            Ok(BillingEvent::SubscriptionActivated(SubscriptionSnapshot {
                product_id: item.item_price_id.clone(),
                seats: item.quantity,
                owner: owner_from_metadata(metadata.as_ref())?,
                status: PurchaseStatus::canonicalize(&subscription.status),
                customer_id: required(
                    subscription
                        .customer_id
                        .clone()
                        .or_else(|| content.customer.as_ref().map(|c| c.id.clone())),
                    "content.subscription.customer_id",
                )?,
                subscription_id: subscription.id.clone(),
            }))
        }
        "subscription_changed"
        | "subscription_renewed"
        | "subscription_paused"
        | "subscription_resumed"
        | "subscription_reactivated"
        | "subscription_cancellation_scheduled" => {
            let subscription = required(content.subscription, "content.subscription")?;
            let item = subscription.plan_item();

            Ok(BillingEvent::SubscriptionUpdated(SubscriptionUpdate {
                product_id: item.map(|i| i.item_price_id.clone()),
                seats: item.and_then(|i| i.quantity),
                status: PurchaseStatus::canonicalize(&subscription.status),
                subscription_id: subscription.id.clone(),
            }))
        }
        "subscription_cancelled" | "subscription_deleted" => {
            let subscription = required(content.subscription, "content.subscription")?;
            Ok(BillingEvent::terminated(subscription.id))
        }
        "payment_succeeded" => {
            let invoice = required(content.invoice, "content.invoice")?;
            if invoice.recurring {
                return Ok(BillingEvent::ignored(event_type));
            }
            let metadata = content
                .customer
                .as_ref()
                .and_then(|c| metadata_map(c.meta_data.as_ref()));
            let product_id = invoice.line_items.first().and_then(|l| l.entity_id.clone());

            Ok(BillingEvent::OneTimeCompleted(CompletedCheckout {
                order_id: Some(invoice.id),
                customer_id: required(
                    invoice
                        .customer_id
                        .or_else(|| content.customer.as_ref().map(|c| c.id.clone())),
                    "content.invoice.customer_id",
                )?,
                product_id: required(product_id, "content.invoice.line_items[0].entity_id")?,
                owner: require_owner(metadata.as_ref())?,
            }))
        }
        _ => Ok(BillingEvent::ignored(event_type)),
    }
}

#[async_trait]
impl PaymentProvider for ChargebeeAdapter {
    fn kind(&self) -> ProviderKind {
        PROVIDER
    }

    async fn create_checkout_link(
        &self,
        request: CheckoutLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        let quantity = request.seats.unwrap_or(1).to_string();

        let (path, mut params) = match request.purchase_type {
            PurchaseType::Subscription => {
                let mut params = vec![
                    ("subscription_items[item_price_id][0]".to_string(), request.product_id.clone()),
                    ("subscription_items[quantity][0]".to_string(), quantity),
                    ("subscription[meta_data]".to_string(), owner_metadata_json(&request.owner)),
                ];
                if let Some(days) = request.trial_period_days {
                    let trial_end = chrono::Utc::now().timestamp() + i64::from(days) * 86_400;
                    params.push(("subscription[trial_end]".to_string(), trial_end.to_string()));
                }
                match (&request.customer_id, &request.email) {
                    (Some(id), _) => params.push(("customer[id]".to_string(), id.clone())),
                    (None, Some(email)) => params.push(("customer[email]".to_string(), email.clone())),
                    (None, None) => {}
                }
                ("hosted_pages/checkout_new_for_items", params)
            }
            PurchaseType::OneTime => {
                // One-time invoices only carry customer metadata back.
                let customer_id = self
                    .prepare_customer(
                        &request.owner,
                        request.customer_id.as_deref(),
                        request.email.as_deref(),
                    )
                    .await?;
                let params = vec![
                    ("customer[id]".to_string(), customer_id),
                    ("item_prices[item_price_id][0]".to_string(), request.product_id.clone()),
                    ("item_prices[quantity][0]".to_string(), quantity),
                ];
                ("hosted_pages/checkout_one_time_for_items", params)
            }
        };
        params.push(("redirect_url".to_string(), request.redirect_url));

        let envelope: HostedPageEnvelope = self.post_form(path, &params).await?;
        Ok(envelope.hosted_page.url)
    }

    async fn create_customer_portal_link(
        &self,
        request: PortalLinkRequest,
    ) -> Result<Option<String>, PaymentError> {
        let mut params = vec![("customer[id]".to_string(), request.customer_id)];
        if let Some(redirect_url) = request.redirect_url {
            params.push(("redirect_url".to_string(), redirect_url));
        }

        let envelope: PortalSessionEnvelope = self.post_form("portal_sessions", &params).await?;
        Ok(envelope.portal_session.access_url)
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
impl SeatManagement for ChargebeeAdapter {
    async fn set_subscription_seats(&self, subscription_id: &str, seats: u32) -> Result<(), PaymentError> {
        let subscription = self.get_subscription(subscription_id).await?;
        let item = subscription
            .plan_item()
            .ok_or_else(|| PaymentError::not_found("subscription plan item"))?;

        let params = vec![
            ("subscription_items[item_price_id][0]".to_string(), item.item_price_id.clone()),
            ("subscription_items[quantity][0]".to_string(), seats.to_string()),
        ];
        let _: SubscriptionEnvelope = self
            .post_form(&format!("subscriptions/{}/update_for_items", subscription_id), &params)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionCancellation for ChargebeeAdapter {
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), PaymentError> {
        let response = self
            .http_client
            .post(self.url(&format!("subscriptions/{}/cancel_for_items", subscription_id)))
            .basic_auth(self.config.api_key.expose_secret(), Some(""))
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
    use axum::http::{HeaderMap, Method, StatusCode};
    use serde_json::json;

    fn adapter() -> ChargebeeAdapter {
        ChargebeeAdapter::new(
            ChargebeeConfig::new("acme-test", "cb_key", "hook", "s3cret"),
            reqwest::Client::new(),
        )
    }

    fn basic(user: &str, pass: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            format!("Basic {}", BASE64.encode(format!("{}:{}", user, pass)))
                .parse()
                .unwrap(),
        );
        headers
    }

    async fn verify(body: &str) -> Result<BillingEvent, WebhookError> {
        let headers = basic("hook", "s3cret");
        adapter()
            .verify_webhook(&WebhookRequest::new(&headers, body.as_bytes()))
            .await
    }

    fn subscription_event(event_type: &str, status: &str) -> String {
        json!({
            "id": "ev_1",
            "event_type": event_type,
            "content": {
                "subscription": {
                    "id": "cb_sub_1",
                    "customer_id": "cb_cus_1",
                    "status": status,
                    "subscription_items": [
                        {"item_price_id": "addon-USD", "quantity": 1, "item_type": "addon"},
                        {"item_price_id": "team-USD-monthly", "quantity": 8, "item_type": "plan"}
                    ],
                    "meta_data": {"organization_id": "org_1"}
                }
            }
        })
        .to_string()
    }

    #[test]
    fn site_determines_api_url() {
        let config = ChargebeeConfig::new("acme", "k", "u", "p");
        assert_eq!(config.api_base_url, "https://acme.chargebee.com/api/v2");
    }

    #[tokio::test]
    async fn wrong_password_is_forbidden() {
        let body = subscription_event("subscription_created", "active");
        let headers = basic("hook", "wrong");
        let err = adapter()
            .verify_webhook(&WebhookRequest::new(&headers, body.as_bytes()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn auth_scheme_is_case_insensitive() {
        let body = subscription_event("subscription_created", "active");
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            format!("basic {}", BASE64.encode("hook:s3cret")).parse().unwrap(),
        );

        let event = adapter()
            .verify_webhook(&WebhookRequest::new(&headers, body.as_bytes()))
            .await
            .unwrap();
        assert!(matches!(event, BillingEvent::SubscriptionActivated(_)));
    }

    #[tokio::test]
    async fn bearer_scheme_is_bad_request() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer aG9vazpzM2NyZXQ=".parse().unwrap());

        let err = adapter()
            .verify_webhook(&WebhookRequest::new(&headers, b"{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::MissingSignature(_)));
    }

    #[tokio::test]
    async fn missing_credentials_are_bad_request() {
        let headers = HeaderMap::new();
        let err = adapter()
            .verify_webhook(&WebhookRequest::new(&headers, b"{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::MissingSignature(_)));
    }

    #[tokio::test]
    async fn subscription_created_uses_plan_item() {
        let body = subscription_event("subscription_created", "in_trial");

        match verify(&body).await.unwrap() {
            BillingEvent::SubscriptionActivated(snapshot) => {
                assert_eq!(snapshot.subscription_id, "cb_sub_1");
                assert_eq!(snapshot.customer_id, "cb_cus_1");
                assert_eq!(snapshot.product_id, "team-USD-monthly");
                assert_eq!(snapshot.seats, Some(8));
                assert_eq!(snapshot.status, PurchaseStatus::Trialing);
                assert_eq!(snapshot.owner, Some(OwnerRef::organization("org_1").unwrap()));
            }
            other => panic!("Expected activation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn string_encoded_metadata_is_read() {
        let body = json!({
            "event_type": "subscription_activated",
            "content": {
                "subscription": {
                    "id": "cb_sub_2",
                    "customer_id": "cb_cus_1",
                    "status": "active",
                    "subscription_items": [{"item_price_id": "basic", "item_type": "plan"}],
                    "meta_data": "{\"user_id\":\"usr_3\"}"
                }
            }
        })
        .to_string();

        match verify(&body).await.unwrap() {
            BillingEvent::SubscriptionActivated(snapshot) => {
                assert_eq!(snapshot.owner, Some(OwnerRef::user("usr_3").unwrap()));
            }
            other => panic!("Expected activation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cancellation_scheduled_keeps_access() {
        let body = subscription_event("subscription_cancellation_scheduled", "non_renewing");
        assert!(matches!(
            verify(&body).await.unwrap(),
            BillingEvent::SubscriptionUpdated(SubscriptionUpdate { status: PurchaseStatus::Active, .. })
        ));
    }

    #[tokio::test]
    async fn subscription_cancelled_is_termination() {
        let body = subscription_event("subscription_cancelled", "cancelled");
        assert_eq!(verify(&body).await.unwrap(), BillingEvent::terminated("cb_sub_1"));
    }

    #[tokio::test]
    async fn one_off_invoice_is_one_time_purchase() {
        let body = json!({
            "event_type": "payment_succeeded",
            "content": {
                "invoice": {
                    "id": "inv_1",
                    "customer_id": "cb_cus_1",
                    "recurring": false,
                    "line_items": [{"entity_id": "lifetime-USD", "entity_type": "charge_item_price"}]
                },
                "customer": {"id": "cb_cus_1", "meta_data": {"user_id": "usr_1"}}
            }
        })
        .to_string();

        match verify(&body).await.unwrap() {
            BillingEvent::OneTimeCompleted(checkout) => {
                assert_eq!(checkout.order_id.as_deref(), Some("inv_1"));
                assert_eq!(checkout.product_id, "lifetime-USD");
                assert_eq!(checkout.owner, OwnerRef::user("usr_1").unwrap());
            }
            other => panic!("Expected one-time purchase, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn recurring_invoice_is_ignored() {
        let body = json!({
            "event_type": "payment_succeeded",
            "content": {"invoice": {"id": "inv_2", "recurring": true}}
        })
        .to_string();
        assert!(matches!(verify(&body).await.unwrap(), BillingEvent::Ignored { .. }));
    }

    fn adapter_for(api: &FakeApi) -> ChargebeeAdapter {
        ChargebeeAdapter::new(
            ChargebeeConfig::new("acme-test", "cb_key", "hook", "s3cret").with_base_url(api.base_url.clone()),
            reqwest::Client::new(),
        )
    }

    #[tokio::test]
    async fn one_time_checkout_creates_customer_first() {
        let api = FakeApi::start(vec![
            (Method::POST, "/customers", 200, json!({"customer": {"id": "cb_new"}})),
            (
                Method::POST,
                "/hosted_pages/checkout_one_time_for_items",
                200,
                json!({"hosted_page": {"id": "hp_1", "url": "https://acme-test.chargebee.com/pages/hp_1"}}),
            ),
        ])
        .await;

        let url = adapter_for(&api)
            .create_checkout_link(CheckoutLinkRequest {
                purchase_type: PurchaseType::OneTime,
                product_id: "lifetime-USD".into(),
                redirect_url: "https://app.example.com/done".into(),
                email: Some("buyer@example.com".into()),
                name: None,
                owner: OwnerRef::organization("org_1").unwrap(),
                seats: None,
                customer_id: None,
                trial_period_days: None,
            })
            .await
            .unwrap();

        assert_eq!(url.as_deref(), Some("https://acme-test.chargebee.com/pages/hp_1"));
        let requests = api.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].form_value("meta_data").as_deref(),
            Some("{\"organization_id\":\"org_1\"}")
        );
        assert_eq!(requests[1].form_value("customer[id]").as_deref(), Some("cb_new"));
        assert_eq!(
            requests[1].form_value("item_prices[item_price_id][0]").as_deref(),
            Some("lifetime-USD")
        );
    }

    #[tokio::test]
    async fn subscription_checkout_carries_metadata() {
        let api = FakeApi::start(vec![(
            Method::POST,
            "/hosted_pages/checkout_new_for_items",
            200,
            json!({"hosted_page": {"url": "https://acme-test.chargebee.com/pages/hp_2"}}),
        )])
        .await;

        adapter_for(&api)
            .create_checkout_link(CheckoutLinkRequest {
                purchase_type: PurchaseType::Subscription,
                product_id: "team-USD-monthly".into(),
                redirect_url: "https://app.example.com/done".into(),
                email: None,
                name: None,
                owner: OwnerRef::user("usr_1").unwrap(),
                seats: Some(3),
                customer_id: Some("cb_cus_1".into()),
                trial_period_days: None,
            })
            .await
            .unwrap();

        let request = api.only_request();
        assert_eq!(
            request.form_value("subscription[meta_data]").as_deref(),
            Some("{\"user_id\":\"usr_1\"}")
        );
        assert_eq!(request.form_value("subscription_items[quantity][0]").as_deref(), Some("3"));
        assert_eq!(request.form_value("customer[id]").as_deref(), Some("cb_cus_1"));
    }

    #[tokio::test]
    async fn set_seats_updates_plan_item() {
        let api = FakeApi::start(vec![
            (
                Method::GET,
                "/subscriptions/cb_sub_1",
                200,
                json!({"subscription": {
                    "id": "cb_sub_1", "status": "active",
                    "subscription_items": [{"item_price_id": "team-USD-monthly", "quantity": 8, "item_type": "plan"}]
                }}),
            ),
            (
                Method::POST,
                "/subscriptions/cb_sub_1/update_for_items",
                200,
                json!({"subscription": {"id": "cb_sub_1", "status": "active"}}),
            ),
        ])
        .await;

        adapter_for(&api).set_subscription_seats("cb_sub_1", 12).await.unwrap();

        let requests = api.requests();
        assert_eq!(
            requests[1].form_value("subscription_items[quantity][0]").as_deref(),
            Some("12")
        );
    }

    #[test]
    fn from_settings_requires_site_or_url() {
        let settings = ChargebeeSettings {
            api_key: Some(SecretString::new("k".into())),
            ..Default::default()
        };
        let err = ChargebeeConfig::from_settings(&settings).err().unwrap();
        assert!(err.message.contains("site"));
    }
}
