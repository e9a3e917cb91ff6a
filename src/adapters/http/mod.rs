//! HTTP adapters - REST API implementations.
//!
//! - `webhooks` - Provider webhook dispatcher
//! - `billing` - Checkout, portal, seat and cancellation endpoints

pub mod billing;
pub mod webhooks;

mod error;
mod state;

pub use error::{ApiError, ErrorResponse};
pub use state::AppState;

use axum::http::{self, header::CONTENT_TYPE, StatusCode};
use axum::{routing::get, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::ServerConfig;

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// All routes with state applied and no middleware.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/webhooks", webhooks::webhook_routes())
        .nest("/billing", billing::billing_routes())
        .with_state(state)
}

/// The full application: routes plus tracing, timeout and CORS layers.
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    let origins: Vec<http::HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE]);

    api_router(state)
        .layer(cors)
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &http::Request<_>| {
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http-request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id
                )
            }),
        )
}
