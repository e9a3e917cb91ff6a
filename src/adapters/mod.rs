//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `providers` - Payment platform APIs and webhook verification
//! - `postgres` - Purchase and customer storage in PostgreSQL
//! - `memory` - In-process storage for development and tests
//! - `http` - Axum routes for webhooks and billing endpoints

pub mod http;
pub mod memory;
pub mod postgres;
pub mod providers;
