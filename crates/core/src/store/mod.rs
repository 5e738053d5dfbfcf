//! Persistence contracts for accounts and transfers.
//!
//! The engine and services only see these traits; the concrete backend
//! (in-memory, PostgreSQL) is chosen at startup and injected as a trait object.
//!
//! # Concurrency
//!
//! `AccountStore::update_balance` is a compare-and-swap keyed by account id:
//! it only applies when the stored balance still equals the value the caller
//! read. Backends must make that check and the write a single atomic step.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::InMemoryStore;

use async_trait::async_trait;
use bankwire_shared::types::{AccountId, Money};

use crate::account::Account;
use crate::transfer::{IdempotencyKey, Transfer};

/// Outcome of claiming an idempotency key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestClaim {
    /// The key was free and now belongs to the caller.
    Claimed,
    /// A transfer was already recorded under this key.
    Completed(Transfer),
    /// Another request holds the key and has not recorded a transfer.
    InFlight,
}

/// Persistence contract for accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Loads an account by id.
    async fn find_by_id(&self, id: AccountId) -> Result<Account, StoreError>;

    /// Lists every account ordered by name.
    async fn find_all(&self) -> Result<Vec<Account>, StoreError>;

    /// Loads only the balance of an account.
    async fn find_balance(&self, id: AccountId) -> Result<Money, StoreError>;

    /// Sets the balance to `new` if it still equals `expected`.
    ///
    /// Never creates a missing account.
    async fn update_balance(
        &self,
        id: AccountId,
        expected: Money,
        new: Money,
    ) -> Result<(), StoreError>;

    /// Persists a newly opened account.
    async fn store(&self, account: Account) -> Result<Account, StoreError>;
}

/// Persistence contract for transfer records and request deduplication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransferStore: Send + Sync {
    /// Appends a transfer record.
    ///
    /// When the transfer carries an idempotency key, the key's claim is marked
    /// completed in the same atomic step.
    async fn append(&self, transfer: Transfer) -> Result<Transfer, StoreError>;

    /// Lists every transfer ordered by creation time.
    async fn find_all(&self) -> Result<Vec<Transfer>, StoreError>;

    /// Claims `key` for a new request.
    async fn claim_request(&self, key: &IdempotencyKey) -> Result<RequestClaim, StoreError>;

    /// Releases an unfinished claim so the key can be used again.
    async fn release_request(&self, key: &IdempotencyKey) -> Result<(), StoreError>;
}
