//! HTTP adapter for provider webhooks.
//!
//! - `POST /webhooks/:provider` - Verify and apply one delivery

mod handlers;
mod routes;

pub use handlers::{provider_for_segment, receive_webhook, success_status};
pub use routes::webhook_routes;
