//! In-memory store backing both contracts.
//!
//! Accounts live in a `DashMap`; a balance compare-and-swap holds the shard
//! lock of that single entry, so concurrent updates of one account serialize
//! while different accounts proceed in parallel. Transfers are an append-only
//! vector. Nothing here awaits while holding a lock.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use bankwire_shared::types::{AccountId, Money, TransferId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{AccountStore, RequestClaim, StoreError, TransferStore};
use crate::account::Account;
use crate::transfer::{IdempotencyKey, Transfer};

/// Process-local store for development and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: DashMap<AccountId, Account>,
    transfers: RwLock<Vec<Transfer>>,
    // `None` while a request holds the key, the transfer id once recorded.
    requests: DashMap<IdempotencyKey, Option<TransferId>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn transfer_by_id(&self, id: TransferId) -> Option<Transfer> {
        self.inner
            .transfers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_by_id(&self, id: AccountId) -> Result<Account, StoreError> {
        self.inner
            .accounts
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::AccountNotFound(id))
    }

    async fn find_all(&self) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> = self
            .inner
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(accounts)
    }

    async fn find_balance(&self, id: AccountId) -> Result<Money, StoreError> {
        self.inner
            .accounts
            .get(&id)
            .map(|entry| entry.value().balance())
            .ok_or(StoreError::AccountNotFound(id))
    }

    async fn update_balance(
        &self,
        id: AccountId,
        expected: Money,
        new: Money,
    ) -> Result<(), StoreError> {
        let mut entry = self
            .inner
            .accounts
            .get_mut(&id)
            .ok_or(StoreError::AccountNotFound(id))?;

        let account = entry.value_mut();
        if account.balance() != expected {
            return Err(StoreError::Conflict(id));
        }

        // Mirrors the CHECK (balance >= 0) constraint of the SQL schema.
        let updated = Account::restore(
            account.id,
            account.name.clone(),
            account.tax_id.clone(),
            new,
            account.created_at,
        )
        .map_err(|e| StoreError::backend(e.to_string()))?;

        *account = updated;
        Ok(())
    }

    async fn store(&self, account: Account) -> Result<Account, StoreError> {
        match self.inner.accounts.entry(account.id) {
            Entry::Occupied(_) => Err(StoreError::backend(format!(
                "account {} already exists",
                account.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(account.clone());
                Ok(account)
            }
        }
    }
}

#[async_trait]
impl TransferStore for InMemoryStore {
    async fn append(&self, transfer: Transfer) -> Result<Transfer, StoreError> {
        let mut transfers = self
            .inner
            .transfers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(key) = &transfer.idempotency_key {
            self.inner.requests.insert(key.clone(), Some(transfer.id));
        }
        transfers.push(transfer.clone());

        Ok(transfer)
    }

    async fn find_all(&self) -> Result<Vec<Transfer>, StoreError> {
        let mut transfers = self
            .inner
            .transfers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        transfers.sort_by_key(|t| t.created_at);
        Ok(transfers)
    }

    async fn claim_request(&self, key: &IdempotencyKey) -> Result<RequestClaim, StoreError> {
        // Copy the state out before touching `transfers`; `append` takes the
        // locks in the opposite order.
        let recorded = match self.inner.requests.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(None);
                return Ok(RequestClaim::Claimed);
            }
            Entry::Occupied(slot) => *slot.get(),
        };

        match recorded {
            None => Ok(RequestClaim::InFlight),
            Some(id) => self
                .transfer_by_id(id)
                .map(RequestClaim::Completed)
                .ok_or_else(|| StoreError::backend(format!("transfer {id} missing for key {key}"))),
        }
    }

    async fn release_request(&self, key: &IdempotencyKey) -> Result<(), StoreError> {
        self.inner
            .requests
            .remove_if(key, |_, recorded| recorded.is_none());
        Ok(())
    }
}
