//! Billing Sync - Payment webhook normalization and purchase reconciliation
//!
//! This crate receives webhooks from several payment platforms, verifies
//! them, and folds them into one canonical purchase record per sale or
//! subscription. It also creates checkout and billing portal links.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
