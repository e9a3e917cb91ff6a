//! Shared harness for the HTTP integration tests.
//!
//! Builds the real router over in-memory stores and real provider adapters
//! configured with test secrets, and signs payloads the way each platform does.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::SecretString;
use tower::ServiceExt;

use billing_sync::adapters::http::{api_router, AppState};
use billing_sync::adapters::memory::{InMemoryCustomerDirectory, InMemoryPurchaseRepository};
use billing_sync::adapters::providers::ProviderRegistry;
use billing_sync::config::PaymentConfig;
use billing_sync::domain::purchase::signature::hmac_sha256;

pub const STRIPE_SECRET: &str = "whsec_stripe_integration";
pub const CREEM_SECRET: &str = "creem_integration_secret";
pub const POLAR_SECRET: &str = "polar_integration_secret";

/// Nothing listens here; outbound calls fail fast.
pub const UNREACHABLE_API: &str = "http://127.0.0.1:9";

pub struct TestApp {
    pub router: Router,
    pub purchases: InMemoryPurchaseRepository,
    pub customers: InMemoryCustomerDirectory,
}

fn secret(value: &str) -> Option<SecretString> {
    Some(SecretString::new(value.to_string()))
}

/// Stripe, Creem and Polar are configured. Chargebee and Lemon Squeezy are not.
pub fn payment_config() -> PaymentConfig {
    let mut config = PaymentConfig::default();
    config.http_timeout_secs = 2;

    config.stripe.api_key = secret("sk_test_integration");
    config.stripe.webhook_secret = secret(STRIPE_SECRET);
    config.stripe.api_base_url = Some(UNREACHABLE_API.to_string());

    config.creem.api_key = secret("creem_test_key");
    config.creem.webhook_secret = secret(CREEM_SECRET);
    config.creem.api_base_url = Some(UNREACHABLE_API.to_string());

    config.polar.access_token = secret("polar_oat_test");
    config.polar.webhook_secret = secret(POLAR_SECRET);
    config.polar.api_base_url = Some(UNREACHABLE_API.to_string());

    config
}

pub fn test_app() -> TestApp {
    let purchases = InMemoryPurchaseRepository::new();
    let customers = InMemoryCustomerDirectory::new();
    let registry = ProviderRegistry::new(payment_config()).unwrap();

    let state = AppState::new(
        Arc::new(registry),
        Arc::new(purchases.clone()),
        Arc::new(customers.clone()),
    );

    TestApp {
        router: api_router(state),
        purchases,
        customers,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, bytes) = self.send(request).await;
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn stripe_request(body: &str) -> Request<Body> {
    let timestamp = now();
    let mac = hmac_sha256(
        STRIPE_SECRET.as_bytes(),
        &[timestamp.to_string().as_bytes(), b".", body.as_bytes()],
    )
    .unwrap();

    Request::post("/webhooks/stripe")
        .header("stripe-signature", format!("t={},v1={}", timestamp, hex::encode(mac)))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn creem_request(body: &str) -> Request<Body> {
    let mac = hmac_sha256(CREEM_SECRET.as_bytes(), &[body.as_bytes()]).unwrap();

    Request::post("/webhooks/creem")
        .header("creem-signature", hex::encode(mac))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn polar_request(webhook_id: &str, body: &str) -> Request<Body> {
    let timestamp = now().to_string();
    let mac = hmac_sha256(
        POLAR_SECRET.as_bytes(),
        &[webhook_id.as_bytes(), b".", timestamp.as_bytes(), b".", body.as_bytes()],
    )
    .unwrap();

    Request::post("/webhooks/polar")
        .header("webhook-id", webhook_id)
        .header("webhook-timestamp", timestamp)
        .header("webhook-signature", format!("v1,{}", BASE64.encode(mac)))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn stripe_subscription_event(
    event_type: &str,
    subscription_id: &str,
    status: &str,
    organization_id: Option<&str>,
) -> String {
    let metadata = match organization_id {
        Some(org) => serde_json::json!({ "organization_id": org }),
        None => serde_json::json!({}),
    };
    serde_json::json!({
        "id": format!("evt_{}_{}", subscription_id, status),
        "type": event_type,
        "data": {
            "object": {
                "id": subscription_id,
                "object": "subscription",
                "customer": "cus_1",
                "status": status,
                "metadata": metadata,
                "items": {
                    "data": [
                        { "id": "si_1", "price": { "id": "price_team" }, "quantity": 3 }
                    ]
                }
            }
        }
    })
    .to_string()
}
