//! Transfer records and requests.

use bankwire_shared::types::{AccountId, Money, TransferId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client-supplied key that deduplicates retried transfer requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Maximum accepted key length.
    pub const MAX_LEN: usize = 255;

    /// Wraps a key, returning `None` if it is blank or too long.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() || trimmed.len() > Self::MAX_LEN {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request to move `amount` from one account to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Account to debit.
    pub origin_id: AccountId,
    /// Account to credit.
    pub destination_id: AccountId,
    /// Amount to move.
    pub amount: Money,
    /// Optional deduplication key.
    pub idempotency_key: Option<IdempotencyKey>,
}

impl TransferRequest {
    /// Creates a request without an idempotency key.
    #[must_use]
    pub const fn new(origin_id: AccountId, destination_id: AccountId, amount: Money) -> Self {
        Self {
            origin_id,
            destination_id,
            amount,
            idempotency_key: None,
        }
    }

    /// Attaches an idempotency key.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: IdempotencyKey) -> Self {
        self.idempotency_key = Some(key);
        self
    }
}

/// Immutable record of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Unique identifier.
    pub id: TransferId,
    /// Debited account.
    pub origin_account_id: AccountId,
    /// Credited account.
    pub destination_account_id: AccountId,
    /// Amount moved; always positive.
    pub amount: Money,
    /// Key of the request that produced this transfer, if any.
    pub idempotency_key: Option<IdempotencyKey>,
    /// When the transfer was recorded.
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    /// Builds the record for an accepted request.
    #[must_use]
    pub fn from_request(request: &TransferRequest) -> Self {
        Self {
            id: TransferId::new(),
            origin_account_id: request.origin_id,
            destination_account_id: request.destination_id,
            amount: request.amount,
            idempotency_key: request.idempotency_key.clone(),
            created_at: Utc::now(),
        }
    }

    /// Returns true if this transfer moved the same value between the same
    /// accounts as `request`.
    #[must_use]
    pub fn matches(&self, request: &TransferRequest) -> bool {
        self.origin_account_id == request.origin_id
            && self.destination_account_id == request.destination_id
            && self.amount == request.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotency_key_trims() {
        let key = IdempotencyKey::new("  abc-123 ").unwrap();
        assert_eq!(key.as_str(), "abc-123");
    }

    #[test]
    fn test_idempotency_key_rejects_blank_and_long() {
        assert!(IdempotencyKey::new("   ").is_none());
        assert!(IdempotencyKey::new("k".repeat(IdempotencyKey::MAX_LEN + 1)).is_none());
        assert!(IdempotencyKey::new("k".repeat(IdempotencyKey::MAX_LEN)).is_some());
    }

    #[test]
    fn test_transfer_from_request_matches() {
        let request = TransferRequest::new(AccountId::new(), AccountId::new(), Money::from_minor(300))
            .with_idempotency_key(IdempotencyKey::new("k1").unwrap());
        let transfer = Transfer::from_request(&request);

        assert!(transfer.matches(&request));
        assert_eq!(transfer.idempotency_key, request.idempotency_key);

        let other = TransferRequest {
            amount: Money::from_minor(301),
            ..request
        };
        assert!(!transfer.matches(&other));
    }
}
