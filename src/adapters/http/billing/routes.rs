//! Axum router configuration for billing endpoints.

use axum::{
    routing::{delete, post, put},
    Router,
};

use super::super::AppState;
use super::handlers::{
    cancel_subscription, create_checkout_link, create_portal_link, set_subscription_seats,
};

/// Billing routes, mounted at `/billing`.
///
/// # Routes
/// - `POST /checkout-link` - Hosted checkout on a chosen platform
/// - `POST /portal-link` - Billing portal for an owner
/// - `PUT /subscriptions/:id/seats` - Change seat quantity
/// - `DELETE /subscriptions/:id` - Cancel on the platform
pub fn billing_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout-link", post(create_checkout_link))
        .route("/portal-link", post(create_portal_link))
        .route("/subscriptions/:id/seats", put(set_subscription_seats))
        .route("/subscriptions/:id", delete(cancel_subscription))
}
