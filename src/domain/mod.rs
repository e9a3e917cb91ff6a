//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `purchase` - Canonical purchases, provider-neutral billing events and
//!   webhook verification helpers

pub mod foundation;
pub mod purchase;
