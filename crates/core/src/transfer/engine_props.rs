//! Property-based tests for TransferEngine.
//!
//! - Value is conserved by every completed transfer
//! - No balance is ever negative, sequentially or under concurrent load
//! - A rejected transfer leaves both balances untouched

use std::sync::Arc;
use std::time::Duration;

use bankwire_shared::types::{AccountId, Money};
use proptest::prelude::*;

use super::engine::{EngineConfig, TransferEngine};
use super::entity::TransferRequest;
use super::error::TransferError;
use crate::account::Account;
use crate::store::{AccountStore, InMemoryStore, TransferStore};

const ACCOUNTS: usize = 4;

/// Strategy for opening balances (0.00 to 50.00).
fn opening_balances() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0i64..5_000, ACCOUNTS)
}

/// Strategy for (origin index, destination index, amount) triples; amounts
/// include zero and values larger than any opening balance.
fn moves(max: usize) -> impl Strategy<Value = Vec<(usize, usize, i64)>> {
    prop::collection::vec((0..ACCOUNTS, 0..ACCOUNTS, 0i64..6_000), 1..max)
}

fn runtime(multi_thread: bool) -> tokio::runtime::Runtime {
    let mut builder = if multi_thread {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.worker_threads(4);
        builder
    } else {
        tokio::runtime::Builder::new_current_thread()
    };
    builder.enable_all().build().unwrap()
}

fn engine(store: &InMemoryStore) -> TransferEngine {
    TransferEngine::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        EngineConfig {
            // Enough attempts that contention alone never fails a transfer.
            max_attempts: 64,
            retry_backoff: Duration::from_micros(50),
            timeout: Duration::from_secs(30),
        },
    )
}

async fn open_accounts(store: &InMemoryStore, balances: &[i64]) -> Vec<AccountId> {
    let mut ids = Vec::with_capacity(balances.len());
    for (i, balance) in balances.iter().enumerate() {
        let account =
            Account::open(format!("holder-{i}"), "12345678900", Money::from_minor(*balance))
                .unwrap();
        ids.push(store.store(account).await.unwrap().id);
    }
    ids
}

async fn balances(store: &InMemoryStore, ids: &[AccountId]) -> Vec<i64> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        out.push(store.find_balance(*id).await.unwrap().minor());
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Each transfer either moves exactly `amount` or changes nothing.
    #[test]
    fn prop_sequential_transfers_conserve_value(
        opening in opening_balances(),
        steps in moves(24),
    ) {
        runtime(false).block_on(async {
            let store = InMemoryStore::new();
            let ids = open_accounts(&store, &opening).await;
            let engine = engine(&store);
            let total: i64 = opening.iter().sum();

            for (from, to, amount) in steps {
                let before = balances(&store, &ids).await;
                let result = engine
                    .execute(TransferRequest::new(ids[from], ids[to], Money::from_minor(amount)))
                    .await;
                let after = balances(&store, &ids).await;

                match result {
                    Ok(transfer) => {
                        prop_assert_eq!(transfer.amount.minor(), amount);
                        prop_assert_eq!(after[from], before[from] - amount);
                        prop_assert_eq!(after[to], before[to] + amount);
                    }
                    Err(err) => {
                        prop_assert!(
                            matches!(
                                err,
                                TransferError::InvalidAmount(_)
                                    | TransferError::SameAccount
                                    | TransferError::InsufficientBalance { .. }
                            ),
                            "unexpected error: {err}"
                        );
                        prop_assert_eq!(&after, &before);
                    }
                }

                prop_assert_eq!(after.iter().sum::<i64>(), total);
                prop_assert!(after.iter().all(|b| *b >= 0));
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Concurrent transfers never overdraw and the records explain every balance.
    #[test]
    fn prop_concurrent_transfers_never_overdraw(
        opening in opening_balances(),
        steps in moves(32),
    ) {
        runtime(true).block_on(async {
            let store = InMemoryStore::new();
            let ids = open_accounts(&store, &opening).await;
            let engine = engine(&store);

            let tasks: Vec<_> = steps
                .into_iter()
                .map(|(from, to, amount)| {
                    let engine = engine.clone();
                    let request =
                        TransferRequest::new(ids[from], ids[to], Money::from_minor(amount));
                    tokio::spawn(async move { engine.execute(request).await })
                })
                .collect();

            let mut completed = 0;
            for task in futures::future::join_all(tasks).await {
                match task.unwrap() {
                    Ok(_) => completed += 1,
                    Err(err) => prop_assert!(
                        matches!(
                            err,
                            TransferError::InvalidAmount(_)
                                | TransferError::SameAccount
                                | TransferError::InsufficientBalance { .. }
                        ),
                        "unexpected error: {err}"
                    ),
                }
            }

            let after = balances(&store, &ids).await;
            prop_assert!(after.iter().all(|b| *b >= 0));
            prop_assert_eq!(after.iter().sum::<i64>(), opening.iter().sum::<i64>());

            // Replaying the recorded transfers over the opening balances
            // must reproduce the final balances.
            let transfers = TransferStore::find_all(&store).await.unwrap();
            prop_assert_eq!(transfers.len(), completed);
            let mut expected = opening.clone();
            for transfer in &transfers {
                let from = ids.iter().position(|id| *id == transfer.origin_account_id).unwrap();
                let to = ids.iter().position(|id| *id == transfer.destination_account_id).unwrap();
                expected[from] -= transfer.amount.minor();
                expected[to] += transfer.amount.minor();
            }
            prop_assert_eq!(after, expected);
            prop_assert_eq!(AccountStore::find_all(&store).await.unwrap().len(), ACCOUNTS);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
