//! Account creation and lookup.

use std::sync::Arc;

use bankwire_shared::AppError;
use bankwire_shared::types::{AccountId, Money};
use thiserror::Error;
use tracing::info;

use super::entity::Account;
use super::error::AccountError;
use crate::store::{AccountStore, StoreError};

/// Errors returned by [`AccountService`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountServiceError {
    /// The new account failed validation.
    #[error(transparent)]
    Invalid(#[from] AccountError),

    /// No account with this id exists.
    #[error("account not found: {0}")]
    NotFound(AccountId),

    /// Store failure.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccountServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<AccountServiceError> for AppError {
    fn from(err: AccountServiceError) -> Self {
        let message = err.to_string();
        match err {
            AccountServiceError::Invalid(_) => Self::Validation(message),
            AccountServiceError::NotFound(_) => Self::NotFound(message),
            AccountServiceError::Store(_) => Self::Database(message),
        }
    }
}

/// Opens accounts and answers balance queries.
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}

impl AccountService {
    /// Creates a service over the given store.
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Opens and persists a new account.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` for a blank name, malformed tax id or negative
    /// balance, `Store` if persisting fails.
    pub async fn create_account(
        &self,
        name: &str,
        tax_id: &str,
        initial_balance: Money,
    ) -> Result<Account, AccountServiceError> {
        let account = Account::open(name, tax_id, initial_balance)?;
        let account = self.accounts.store(account).await?;

        info!(account_id = %account.id, balance = %account.balance(), "Account created");
        Ok(account)
    }

    /// Lists every account ordered by name.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AccountServiceError> {
        Ok(self.accounts.find_all().await?)
    }

    /// Returns the current balance of an account.
    pub async fn get_balance(&self, id: AccountId) -> Result<Money, AccountServiceError> {
        Ok(self.accounts.find_balance(id).await?)
    }
}
