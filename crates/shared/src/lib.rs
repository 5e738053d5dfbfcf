//! Shared types, errors, and configuration for Bankwire.
//!
//! This crate provides common types used across all other crates:
//! - Money as integer minor units
//! - Typed IDs for type-safe entity references
//! - Application-wide error classification
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
