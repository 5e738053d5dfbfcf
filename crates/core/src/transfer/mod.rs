//! Money movement between accounts.
//!
//! This module implements:
//! - Transfer records, requests and idempotency keys
//! - The `TransferEngine` that debits, credits and records a transfer
//! - Error types for transfer execution

pub mod engine;
pub mod entity;
pub mod error;

#[cfg(test)]
mod engine_props;

pub use engine::{EngineConfig, TransferEngine};
pub use entity::{IdempotencyKey, Transfer, TransferRequest};
pub use error::{TransferError, TransferStage};
