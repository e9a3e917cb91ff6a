//! PostgreSQL adapters - Database implementations for persistence ports.
//!
//! - `PostgresPurchaseRepository` - Canonical purchases
//! - `PostgresCustomerDirectory` - Owner to external customer links

mod customer_directory;
mod purchase_repository;

pub use customer_directory::PostgresCustomerDirectory;
pub use purchase_repository::PostgresPurchaseRepository;
