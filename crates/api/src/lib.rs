//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes under `/v1`
//! - Request extractors with field validation
//! - The `{"errors": [...]}` error envelope

pub mod error;
pub mod extractors;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use bankwire_core::{AccountService, AccountStore, EngineConfig, TransferEngine, TransferStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorResponse};

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Account creation and lookup.
    pub accounts: AccountService,
    /// Transfer execution.
    pub transfers: TransferEngine,
}

impl AppState {
    /// Builds the services over the given stores.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        transfers: Arc<dyn TransferStore>,
        engine: EngineConfig,
    ) -> Self {
        Self {
            accounts: AccountService::new(accounts.clone()),
            transfers: TransferEngine::new(accounts, transfers, engine),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
