//! API route definitions.

use axum::{Json, Router, routing::get};
use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

use crate::AppState;

pub mod accounts;
pub mod transfers;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .merge(accounts::routes())
        .merge(transfers::routes())
}

/// Liveness probe body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process serves requests.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Rejects negative values and sub-cent precision.
fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative"));
    }
    if value.normalize().scale() > 2 {
        return Err(ValidationError::new("precision"));
    }
    Ok(())
}

/// Like [`validate_money`], also rejecting zero.
fn validate_positive_money(value: &Decimal) -> Result<(), ValidationError> {
    validate_money(value)?;
    if value.is_zero() {
        return Err(ValidationError::new("zero"));
    }
    Ok(())
}
