//! Store error types.

use bankwire_shared::types::AccountId;
use thiserror::Error;

/// Errors reported by store implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No account with this id exists.
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    /// The balance changed since it was read.
    #[error("balance of account {0} was modified concurrently")]
    Conflict(AccountId),

    /// Underlying backend failure.
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a backend error.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Returns true for an optimistic-concurrency conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
