//! HTTP adapter for billing endpoints.
//!
//! - `POST /billing/checkout-link` - Create a hosted checkout link
//! - `POST /billing/portal-link` - Create a billing portal link
//! - `PUT /billing/subscriptions/:id/seats` - Set subscription seats
//! - `DELETE /billing/subscriptions/:id` - Cancel a subscription

pub mod dto;
mod handlers;
mod routes;

pub use dto::*;
pub use routes::billing_routes;
