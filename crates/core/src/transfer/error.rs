//! Transfer error types.
//!
//! Variants fall in three groups:
//! - rejected before any I/O (`InvalidAmount`, `SameAccount`)
//! - terminal business outcomes with nothing persisted (`AccountNotFound`,
//!   `InsufficientBalance`, `DuplicateRequest`, `DeadlineExceeded`, `Store`)
//! - `PartialFailure`, raised once a balance update has been persisted

use bankwire_shared::AppError;
use bankwire_shared::types::{AccountId, Money};
use thiserror::Error;

use super::entity::IdempotencyKey;
use crate::store::StoreError;

/// Step of the transfer sequence that failed after the origin was debited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    /// Persisting the destination's new balance.
    CreditDestination,
    /// Appending the transfer record.
    RecordTransfer,
}

impl std::fmt::Display for TransferStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreditDestination => write!(f, "credit destination"),
            Self::RecordTransfer => write!(f, "record transfer"),
        }
    }
}

/// Errors that can occur while executing a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Amount is zero, negative, or would overflow the destination.
    #[error("amount must be positive: {0}")]
    InvalidAmount(Money),

    /// Origin and destination are the same account.
    #[error("origin and destination accounts must differ")]
    SameAccount,

    /// One of the accounts does not exist.
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    /// Origin balance is lower than the amount.
    #[error("origin account does not have sufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Origin account.
        account_id: AccountId,
        /// Origin balance at the time of the check.
        available: Money,
        /// Requested amount.
        requested: Money,
    },

    /// Idempotency key is held by an unfinished request or was used for a different transfer.
    #[error("idempotency key '{0}' is already in use")]
    DuplicateRequest(IdempotencyKey),

    /// Deadline elapsed before any balance was persisted.
    #[error("transfer deadline exceeded before any change was applied")]
    DeadlineExceeded,

    /// Store failure with nothing persisted.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A balance update was persisted but a later step failed.
    #[error("transfer failed at {stage} after debiting the origin (reverted: {compensated}): {reason}")]
    PartialFailure {
        /// Step that failed.
        stage: TransferStage,
        /// True if the applied balance changes were reversed.
        compensated: bool,
        /// What went wrong.
        reason: String,
    },
}

impl TransferError {
    /// Returns true if the ledger is guaranteed unchanged by the failed call.
    #[must_use]
    pub const fn left_ledger_unchanged(&self) -> bool {
        !matches!(
            self,
            Self::PartialFailure {
                compensated: false,
                ..
            }
        )
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        let message = err.to_string();
        match err {
            TransferError::InvalidAmount(_) | TransferError::SameAccount => Self::Validation(message),
            TransferError::AccountNotFound(_) => Self::NotFound(message),
            TransferError::InsufficientBalance { .. } => Self::BusinessRule(message),
            TransferError::DuplicateRequest(_) => Self::Conflict(message),
            TransferError::DeadlineExceeded => Self::Timeout(message),
            TransferError::Store(_) => Self::Database(message),
            TransferError::PartialFailure { .. } => Self::Reconciliation(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let id = AccountId::new();
        let cases = [
            (TransferError::InvalidAmount(Money::ZERO), 400),
            (TransferError::SameAccount, 400),
            (TransferError::AccountNotFound(id), 404),
            (
                TransferError::InsufficientBalance {
                    account_id: id,
                    available: Money::from_minor(100),
                    requested: Money::from_minor(150),
                },
                422,
            ),
            (
                TransferError::DuplicateRequest(IdempotencyKey::new("k").unwrap()),
                409,
            ),
            (TransferError::DeadlineExceeded, 504),
            (TransferError::Store(StoreError::backend("down")), 500),
            (
                TransferError::PartialFailure {
                    stage: TransferStage::RecordTransfer,
                    compensated: false,
                    reason: "down".into(),
                },
                500,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_partial_failure_is_distinct() {
        let err: AppError = TransferError::PartialFailure {
            stage: TransferStage::CreditDestination,
            compensated: false,
            reason: "timeout".into(),
        }
        .into();
        assert_eq!(err.error_code(), "RECONCILIATION_REQUIRED");
        assert_ne!(
            AppError::from(TransferError::Store(StoreError::backend("x"))).error_code(),
            err.error_code()
        );
    }

    #[test]
    fn test_partial_failure_message() {
        let err = TransferError::PartialFailure {
            stage: TransferStage::RecordTransfer,
            compensated: true,
            reason: "disk full".into(),
        };
        assert_eq!(
            err.to_string(),
            "transfer failed at record transfer after debiting the origin (reverted: true): disk full"
        );
        assert!(err.left_ledger_unchanged());
    }

    #[test]
    fn test_uncompensated_failure_changes_ledger() {
        let err = TransferError::PartialFailure {
            stage: TransferStage::CreditDestination,
            compensated: false,
            reason: "down".into(),
        };
        assert!(!err.left_ledger_unchanged());
        assert!(TransferError::SameAccount.left_ledger_unchanged());
    }
}
