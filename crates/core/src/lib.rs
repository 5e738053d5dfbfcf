//! Core business logic for Bankwire.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached only through the store traits, which backends implement.
//!
//! # Modules
//!
//! - `account` - Account aggregate, tax id validation and `AccountService`
//! - `store` - Persistence contracts and the in-memory backend
//! - `transfer` - Transfer records and the `TransferEngine`

pub mod account;
pub mod store;
pub mod transfer;

pub use account::{Account, AccountError, AccountService, AccountServiceError};
pub use store::{AccountStore, InMemoryStore, RequestClaim, StoreError, TransferStore};
pub use transfer::{
    EngineConfig, IdempotencyKey, Transfer, TransferEngine, TransferError, TransferRequest,
    TransferStage,
};
