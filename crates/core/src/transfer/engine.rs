//! Transfer execution.
//!
//! A transfer runs as a fixed sequence against the store contracts:
//!
//! 1. Load origin and destination
//! 2. Debit and credit the in-memory copies
//! 3. Persist the origin balance (compare-and-swap on the value read)
//! 4. Persist the destination balance (compare-and-swap)
//! 5. Append the transfer record
//!
//! A conflict at step 3 means nothing was persisted and the whole sequence is
//! retried. Once step 3 has landed, any later failure is answered with
//! reversing balance updates and reported as [`TransferError::PartialFailure`].

use std::sync::Arc;
use std::time::Duration;

use bankwire_shared::config::TransferConfig;
use bankwire_shared::types::{AccountId, Money};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, info, warn};

use super::entity::{IdempotencyKey, Transfer, TransferRequest};
use super::error::{TransferError, TransferStage};
use crate::account::{Account, AccountError};
use crate::store::{AccountStore, RequestClaim, StoreError, TransferStore};

const DEADLINE_REASON: &str = "deadline exceeded";

/// Tuning knobs for [`TransferEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Attempts per transfer (and per reversal) when a balance changed concurrently.
    pub max_attempts: u32,
    /// Base delay between attempts, multiplied by the attempt number.
    pub retry_backoff: Duration,
    /// Deadline applied by [`TransferEngine::execute`].
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&TransferConfig::default())
    }
}

impl From<&TransferConfig> for EngineConfig {
    fn from(config: &TransferConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            retry_backoff: config.retry_backoff(),
            timeout: config.timeout(),
        }
    }
}

/// Balance change that undoes one side of a transfer.
#[derive(Debug, Clone, Copy)]
enum Reversal {
    /// Give the amount back to the origin.
    Refund(AccountId, Money),
    /// Take the amount back from the destination.
    Revoke(AccountId, Money),
}

impl Reversal {
    const fn account_id(self) -> AccountId {
        match self {
            Self::Refund(id, _) | Self::Revoke(id, _) => id,
        }
    }

    fn apply(self, balance: Money) -> Option<Money> {
        match self {
            Self::Refund(_, amount) => balance.checked_add(amount),
            Self::Revoke(_, amount) => balance.checked_sub(amount).filter(|b| !b.is_negative()),
        }
    }
}

/// Executes transfers over injected account and transfer stores.
///
/// Holds no account state between calls; all coordination between
/// concurrent transfers happens through the stores' compare-and-swap.
#[derive(Clone)]
pub struct TransferEngine {
    accounts: Arc<dyn AccountStore>,
    transfers: Arc<dyn TransferStore>,
    config: EngineConfig,
}

impl std::fmt::Debug for TransferEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TransferEngine {
    /// Creates an engine.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        transfers: Arc<dyn TransferStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            accounts,
            transfers,
            config,
        }
    }

    /// Executes a transfer within the configured timeout.
    ///
    /// # Errors
    ///
    /// See [`TransferEngine::execute_until`].
    pub async fn execute(&self, request: TransferRequest) -> Result<Transfer, TransferError> {
        let deadline = Instant::now() + self.config.timeout;
        self.execute_until(request, deadline).await
    }

    /// Executes a transfer that must finish by `deadline`.
    ///
    /// Amount and account checks happen before any store call. A request
    /// carrying an idempotency key that already produced a transfer returns
    /// that transfer without moving money again.
    ///
    /// A key whose claim cannot be released after a failure (or whose claim
    /// call outlived the deadline) keeps reporting in flight, and later
    /// requests with it fail with `DuplicateRequest` until an operator frees it.
    ///
    /// # Errors
    ///
    /// Returns `TransferError`; only `PartialFailure { compensated: false, .. }`
    /// can leave the persisted balances changed.
    pub async fn execute_until(
        &self,
        request: TransferRequest,
        deadline: Instant,
    ) -> Result<Transfer, TransferError> {
        Self::validate(&request)?;

        let Some(key) = request.idempotency_key.clone() else {
            return self.run(&request, deadline).await;
        };

        match self.claim(&key, deadline).await? {
            RequestClaim::Claimed => {}
            RequestClaim::Completed(transfer) if transfer.matches(&request) => {
                info!(
                    transfer_id = %transfer.id,
                    idempotency_key = %key,
                    "Replayed completed transfer"
                );
                return Ok(transfer);
            }
            RequestClaim::Completed(_) | RequestClaim::InFlight => {
                return Err(TransferError::DuplicateRequest(key));
            }
        }

        let result = self.run(&request, deadline).await;

        // A claim only stays behind when money may have moved.
        if let Err(err) = &result {
            if err.left_ledger_unchanged() {
                if let Err(release_err) = self.transfers.release_request(&key).await {
                    error!(
                        idempotency_key = %key,
                        error = %release_err,
                        "Failed to release idempotency key, it stays in flight"
                    );
                }
            }
        }

        result
    }

    /// Lists every recorded transfer ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Store` if the store fails.
    pub async fn list_transfers(&self) -> Result<Vec<Transfer>, TransferError> {
        Ok(self.transfers.find_all().await?)
    }

    fn validate(request: &TransferRequest) -> Result<(), TransferError> {
        if !request.amount.is_positive() {
            return Err(TransferError::InvalidAmount(request.amount));
        }
        if request.origin_id == request.destination_id {
            return Err(TransferError::SameAccount);
        }
        Ok(())
    }

    async fn run(
        &self,
        request: &TransferRequest,
        deadline: Instant,
    ) -> Result<Transfer, TransferError> {
        let mut attempt = 1;
        loop {
            match self.attempt(request, deadline).await {
                Err(TransferError::Store(StoreError::Conflict(account_id)))
                    if attempt < self.config.max_attempts =>
                {
                    debug!(
                        %account_id,
                        attempt,
                        "Balance changed concurrently, retrying transfer"
                    );
                    let wake = Instant::now() + self.config.retry_backoff * attempt;
                    tokio::time::sleep_until(wake.min(deadline)).await;
                    attempt += 1;
                }
                Ok(transfer) => {
                    info!(
                        transfer_id = %transfer.id,
                        origin = %transfer.origin_account_id,
                        destination = %transfer.destination_account_id,
                        amount = %transfer.amount,
                        attempt,
                        "Transfer completed"
                    );
                    return Ok(transfer);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt(
        &self,
        request: &TransferRequest,
        deadline: Instant,
    ) -> Result<Transfer, TransferError> {
        let mut origin = self.load(request.origin_id, deadline).await?;
        let mut destination = self.load(request.destination_id, deadline).await?;
        let origin_before = origin.balance();
        let destination_before = destination.balance();

        origin.debit(request.amount).map_err(|err| match err {
            AccountError::InsufficientBalance {
                available,
                requested,
            } => TransferError::InsufficientBalance {
                account_id: request.origin_id,
                available,
                requested,
            },
            _ => TransferError::InvalidAmount(request.amount),
        })?;
        destination
            .credit(request.amount)
            .map_err(|_| TransferError::InvalidAmount(request.amount))?;

        check_deadline(deadline)?;
        self.accounts
            .update_balance(origin.id, origin_before, origin.balance())
            .await?;

        // The origin is debited from here on; every exit path must either
        // finish the transfer or try to put the money back.
        let refund = Reversal::Refund(origin.id, request.amount);

        if check_deadline(deadline).is_err() {
            let compensated = self.compensate(&[refund]).await;
            return Err(partial_failure(
                TransferStage::CreditDestination,
                compensated,
                DEADLINE_REASON.to_string(),
            ));
        }

        if let Err(err) = self
            .accounts
            .update_balance(destination.id, destination_before, destination.balance())
            .await
        {
            let compensated = self.compensate(&[refund]).await;
            // A reverted conflict leaves nothing applied; the caller retries.
            if compensated && err.is_conflict() {
                return Err(TransferError::Store(err));
            }
            return Err(partial_failure(
                TransferStage::CreditDestination,
                compensated,
                err.to_string(),
            ));
        }

        let reversals = [Reversal::Revoke(destination.id, request.amount), refund];

        if check_deadline(deadline).is_err() {
            let compensated = self.compensate(&reversals).await;
            return Err(partial_failure(
                TransferStage::RecordTransfer,
                compensated,
                DEADLINE_REASON.to_string(),
            ));
        }

        match self.transfers.append(Transfer::from_request(request)).await {
            Ok(transfer) => Ok(transfer),
            Err(err) => {
                let compensated = self.compensate(&reversals).await;
                Err(partial_failure(
                    TransferStage::RecordTransfer,
                    compensated,
                    err.to_string(),
                ))
            }
        }
    }

    async fn claim(
        &self,
        key: &IdempotencyKey,
        deadline: Instant,
    ) -> Result<RequestClaim, TransferError> {
        check_deadline(deadline)?;
        match timeout_at(deadline, self.transfers.claim_request(key)).await {
            Ok(claim) => Ok(claim?),
            Err(_) => {
                // The abandoned claim may still have landed.
                warn!(idempotency_key = %key, "Claiming idempotency key timed out");
                Err(TransferError::DeadlineExceeded)
            }
        }
    }

    async fn load(&self, id: AccountId, deadline: Instant) -> Result<Account, TransferError> {
        check_deadline(deadline)?;
        match timeout_at(deadline, self.accounts.find_by_id(id)).await {
            Ok(Ok(account)) => Ok(account),
            Ok(Err(StoreError::AccountNotFound(id))) => Err(TransferError::AccountNotFound(id)),
            Ok(Err(err)) => Err(TransferError::Store(err)),
            Err(_) => Err(TransferError::DeadlineExceeded),
        }
    }

    /// Applies `reversals` in order, stopping at the first that cannot be applied.
    ///
    /// Not bounded by the request deadline.
    async fn compensate(&self, reversals: &[Reversal]) -> bool {
        for reversal in reversals {
            if let Err(reason) = self.reverse(*reversal).await {
                error!(
                    account_id = %reversal.account_id(),
                    ?reversal,
                    %reason,
                    "Failed to reverse balance change"
                );
                return false;
            }
        }
        true
    }

    async fn reverse(&self, reversal: Reversal) -> Result<(), String> {
        let id = reversal.account_id();
        for attempt in 1..=self.config.max_attempts {
            let current = self
                .accounts
                .find_balance(id)
                .await
                .map_err(|e| e.to_string())?;
            let target = reversal
                .apply(current)
                .ok_or_else(|| format!("balance {current} cannot absorb {reversal:?}"))?;

            match self.accounts.update_balance(id, current, target).await {
                Ok(()) => return Ok(()),
                Err(StoreError::Conflict(_)) => {
                    debug!(account_id = %id, attempt, "Balance changed during reversal, retrying");
                    tokio::time::sleep(self.config.retry_backoff * attempt).await;
                }
                Err(err) => return Err(err.to_string()),
            }
        }
        Err(format!(
            "balance kept changing for {} attempts",
            self.config.max_attempts
        ))
    }
}

fn check_deadline(deadline: Instant) -> Result<(), TransferError> {
    if Instant::now() >= deadline {
        return Err(TransferError::DeadlineExceeded);
    }
    Ok(())
}

fn partial_failure(
    stage: TransferStage,
    compensated: bool,
    reason: String,
) -> TransferError {
    if compensated {
        warn!(%stage, %reason, "Transfer failed after debit, balances reverted");
    } else {
        error!(%stage, %reason, "Transfer failed after debit, reconciliation required");
    }
    TransferError::PartialFailure {
        stage,
        compensated,
        reason,
    }
}
