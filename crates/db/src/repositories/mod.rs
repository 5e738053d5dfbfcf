//! Repository abstractions for data access.
//!
//! Repositories implement the core store contracts over PostgreSQL, hiding
//! the `SeaORM` implementation details from the rest of the application.

pub mod account;
pub mod transfer;

pub use account::AccountRepository;
pub use transfer::TransferRepository;

use bankwire_core::StoreError;
use sea_orm::DbErr;
use tracing::error;

/// Converts a driver error into the store's backend variant.
fn backend(err: DbErr) -> StoreError {
    error!(error = %err, "Database operation failed");
    StoreError::backend(err.to_string())
}
