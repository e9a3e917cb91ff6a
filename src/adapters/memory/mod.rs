//! In-memory adapters for persistence ports.
//!
//! Used when no database is configured and throughout the test suite.
//! They enforce the same uniqueness rules as the PostgreSQL schema.

mod customer_directory;
mod purchase_repository;

pub use customer_directory::InMemoryCustomerDirectory;
pub use purchase_repository::InMemoryPurchaseRepository;
