//! Account error types for validation and balance rules.

use bankwire_shared::types::Money;
use thiserror::Error;

/// Errors raised by the account aggregate itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// Holder name is empty or whitespace.
    #[error("name is required")]
    EmptyName,

    /// Holder name longer than [`MAX_NAME_LEN`](super::MAX_NAME_LEN) characters.
    #[error("name must be at most {max} characters, got {len}")]
    NameTooLong {
        /// Length of the trimmed name in characters.
        len: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Tax identifier does not match the expected format.
    #[error("tax id '{0}' is invalid")]
    InvalidTaxId(String),

    /// Opening balance below zero.
    #[error("initial balance cannot be negative: {0}")]
    NegativeBalance(Money),

    /// Debit or credit amount is zero or negative.
    #[error("amount must be positive: {0}")]
    NonPositiveAmount(Money),

    /// Debit would take the balance below zero.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Balance before the debit.
        available: Money,
        /// Requested debit.
        requested: Money,
    },

    /// Credit would overflow the balance representation.
    #[error("balance overflow crediting {0}")]
    BalanceOverflow(Money),
}
