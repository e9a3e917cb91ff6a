//! Integration tests for the webhook dispatcher.
//!
//! Signed deliveries are driven through the real router and provider
//! adapters; the in-memory stores are inspected afterwards.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use billing_sync::domain::purchase::{OwnerRef, ProviderKind, PurchaseStatus, PurchaseType};
use billing_sync::ports::{CustomerDirectory, PurchaseRepository};

use common::{
    creem_request, polar_request, stripe_request, stripe_subscription_event, test_app, now,
    STRIPE_SECRET,
};

fn org(id: &str) -> OwnerRef {
    OwnerRef::organization(id).unwrap()
}

fn creem_checkout_completed() -> String {
    json!({
        "id": "evt_creem_1",
        "eventType": "checkout.completed",
        "object": {
            "id": "ch_1",
            "order": { "id": "ord_1", "amount": 4900 },
            "customer": { "id": "cust_1", "email": "buyer@example.com" },
            "product": { "id": "p_123", "billing_type": "onetime" },
            "metadata": { "organization_id": "org_1" }
        }
    })
    .to_string()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn creem_one_time_checkout_creates_purchase() {
    let app = test_app();

    let (status, body) = app.send(creem_request(&creem_checkout_completed())).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let rows = app.purchases.all().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].purchase_type, PurchaseType::OneTime);
    assert_eq!(rows[0].product_id, "p_123");
    assert_eq!(rows[0].provider, ProviderKind::Creem);
    assert_eq!(rows[0].owner(), &org("org_1"));

    let link = app.customers.find_by_owner(&org("org_1")).await.unwrap().unwrap();
    assert_eq!(link.customer_id, "cust_1");
}

#[tokio::test]
async fn repeated_one_time_delivery_is_recorded_once() {
    let app = test_app();
    let body = creem_checkout_completed();

    let (first, _) = app.send(creem_request(&body)).await;
    let (second, _) = app.send(creem_request(&body)).await;

    assert_eq!(first, StatusCode::NO_CONTENT);
    assert_eq!(second, StatusCode::NO_CONTENT);
    assert_eq!(app.purchases.count().await, 1);
}

#[tokio::test]
async fn trialing_then_past_due_leaves_one_row() {
    let app = test_app();

    let created = stripe_subscription_event(
        "customer.subscription.created",
        "sub_1",
        "trialing",
        Some("org_1"),
    );
    let updated =
        stripe_subscription_event("customer.subscription.updated", "sub_1", "past_due", None);

    let (s1, _) = app.send(stripe_request(&created)).await;
    let (s2, _) = app.send(stripe_request(&updated)).await;

    assert_eq!(s1, StatusCode::NO_CONTENT);
    assert_eq!(s2, StatusCode::NO_CONTENT);
    let rows = app.purchases.all().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, PurchaseStatus::PastDue);
    assert_eq!(rows[0].seats, Some(3));
    assert_eq!(rows[0].product_id, "price_team");
}

#[tokio::test]
async fn replayed_activation_is_idempotent() {
    let app = test_app();
    let created =
        stripe_subscription_event("customer.subscription.created", "sub_1", "active", Some("org_1"));

    for _ in 0..3 {
        let (status, _) = app.send(stripe_request(&created)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    assert_eq!(app.purchases.count().await, 1);
}

#[tokio::test]
async fn update_for_unknown_subscription_is_acknowledged_without_write() {
    let app = test_app();
    let updated =
        stripe_subscription_event("customer.subscription.updated", "sub_404", "active", None);

    let (status, _) = app.send(stripe_request(&updated)).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.purchases.count().await, 0);
}

#[tokio::test]
async fn double_termination_never_errors() {
    let app = test_app();
    let created =
        stripe_subscription_event("customer.subscription.created", "sub_1", "active", Some("org_1"));
    let deleted =
        stripe_subscription_event("customer.subscription.deleted", "sub_1", "canceled", None);

    app.send(stripe_request(&created)).await;
    let (first, _) = app.send(stripe_request(&deleted)).await;
    let (second, _) = app.send(stripe_request(&deleted)).await;

    assert_eq!(first, StatusCode::NO_CONTENT);
    assert_eq!(second, StatusCode::NO_CONTENT);
    assert_eq!(app.purchases.count().await, 0);
}

#[tokio::test]
async fn replay_with_different_owner_keeps_original_owner() {
    let app = test_app();

    let original =
        stripe_subscription_event("customer.subscription.created", "sub_1", "active", Some("org_1"));
    let hijack =
        stripe_subscription_event("customer.subscription.created", "sub_1", "active", Some("org_2"));

    app.send(stripe_request(&original)).await;
    let (status, _) = app.send(stripe_request(&hijack)).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    let stored = app.purchases.find_by_subscription_id("sub_1").await.unwrap().unwrap();
    assert_eq!(stored.owner(), &org("org_1"));
    assert!(app.customers.find_by_owner(&org("org_2")).await.unwrap().is_none());
}

#[tokio::test]
async fn polar_activation_is_accepted() {
    let app = test_app();
    let body = json!({
        "type": "subscription.active",
        "data": {
            "id": "polar_sub_1",
            "customer_id": "ctm_1",
            "product_id": "prod_1",
            "status": "active",
            "metadata": { "user_id": "usr_1" }
        }
    })
    .to_string();

    let (status, response_body) = app.send(polar_request("msg_1", &body)).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(response_body.is_empty());
    let stored = app
        .purchases
        .find_by_subscription_id("polar_sub_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.owner(), &OwnerRef::user("usr_1").unwrap());
}

#[tokio::test]
async fn unhandled_event_type_is_acknowledged() {
    let app = test_app();
    let body = json!({
        "id": "evt_1",
        "type": "invoice.finalized",
        "data": { "object": { "id": "in_1" } }
    })
    .to_string();

    let (status, _) = app.send(stripe_request(&body)).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.purchases.count().await, 0);
}

// =============================================================================
// Rejections
// =============================================================================

#[tokio::test]
async fn tampered_body_is_forbidden_and_writes_nothing() {
    let app = test_app();
    let signed = creem_checkout_completed();
    let signature = {
        let request = creem_request(&signed);
        request.headers()["creem-signature"].clone()
    };
    let tampered = signed.replace("p_123", "p_999");

    let request = Request::post("/webhooks/creem")
        .header("creem-signature", signature)
        .body(Body::from(tampered))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.is_empty());
    assert_eq!(app.purchases.count().await, 0);
    assert_eq!(app.customers.count().await, 0);
}

#[tokio::test]
async fn missing_signature_is_bad_request() {
    let app = test_app();
    let request = Request::post("/webhooks/stripe")
        .body(Body::from("{}"))
        .unwrap();

    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stale_stripe_signature_is_forbidden() {
    use billing_sync::domain::purchase::signature::hmac_sha256;

    let app = test_app();
    let body =
        stripe_subscription_event("customer.subscription.created", "sub_1", "active", Some("org_1"));
    let stale = now() - 3600;
    let mac = hmac_sha256(
        STRIPE_SECRET.as_bytes(),
        &[stale.to_string().as_bytes(), b".", body.as_bytes()],
    )
    .unwrap();

    let request = Request::post("/webhooks/stripe")
        .header("stripe-signature", format!("t={},v1={}", stale, hex::encode(mac)))
        .body(Body::from(body))
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.purchases.count().await, 0);
}

#[tokio::test]
async fn one_time_without_owner_metadata_is_bad_request() {
    let app = test_app();
    let body = json!({
        "eventType": "checkout.completed",
        "object": {
            "id": "ch_2",
            "customer": "cust_2",
            "product": "p_123",
            "metadata": {}
        }
    })
    .to_string();

    let (status, _) = app.send(creem_request(&body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.purchases.count().await, 0);
}

#[tokio::test]
async fn unknown_provider_is_not_found() {
    let app = test_app();
    let request = Request::post("/webhooks/paddle")
        .body(Body::from("{}"))
        .unwrap();

    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unconfigured_provider_is_server_error() {
    let app = test_app();
    let request = Request::post("/webhooks/chargebee")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::from("{}"))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
}

#[tokio::test]
async fn misconfigured_provider_does_not_affect_others() {
    let app = test_app();

    let (chargebee, _) = app
        .send(
            Request::post("/webhooks/chargebee")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
    let (creem, _) = app.send(creem_request(&creem_checkout_completed())).await;

    assert_eq!(chargebee, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(creem, StatusCode::NO_CONTENT);
}
