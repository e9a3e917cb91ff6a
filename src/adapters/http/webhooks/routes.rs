//! Axum router for provider webhooks.

use axum::{routing::post, Router};

use super::super::AppState;
use super::handlers::receive_webhook;

/// Webhook routes, mounted at `/webhooks`.
///
/// No authentication: each delivery is verified by its provider signature.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/:provider", post(receive_webhook))
}
