//! Ledger accounts.
//!
//! This module implements:
//! - The `Account` aggregate and its debit/credit rules
//! - Tax identifier validation
//! - `AccountService` for creation, listing and balance lookup

pub mod entity;
pub mod error;
pub mod service;
pub mod tax_id;

pub use entity::{Account, MAX_NAME_LEN};
pub use error::AccountError;
pub use service::{AccountService, AccountServiceError};
pub use tax_id::TaxId;
