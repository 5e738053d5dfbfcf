//! Account routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    routing::get,
};
use bankwire_core::account::{Account, MAX_NAME_LEN, TaxId};
use bankwire_shared::types::{AccountId, Money};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::validate_money;
use crate::{AppState, error::ApiError, extractors::ValidatedJson};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/{account_id}/balance", get(get_balance))
}

/// Request body for opening an account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    /// Holder name.
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    /// Holder tax id, 11 digits with optional `ddd.ddd.ddd-dd` separators.
    #[validate(custom(
        function = "validate_tax_id",
        message = "tax_id must be 11 digits, optionally formatted as 000.000.000-00"
    ))]
    pub tax_id: String,
    /// Opening balance in major units.
    #[serde(default)]
    #[validate(custom(
        function = "validate_money",
        message = "balance must be zero or positive with at most two decimal places"
    ))]
    pub balance: Decimal,
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("blank").with_message("name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::new("too_long")
            .with_message(format!("name must be at most {MAX_NAME_LEN} characters").into()));
    }
    Ok(())
}

fn validate_tax_id(tax_id: &str) -> Result<(), ValidationError> {
    if TaxId::is_valid(tax_id) {
        Ok(())
    } else {
        Err(ValidationError::new("tax_id"))
    }
}

/// Response for an account.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: AccountId,
    /// Holder name.
    pub name: String,
    /// Holder tax id as entered.
    pub tax_id: String,
    /// Current balance in major units.
    pub balance: Decimal,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            balance: account.balance().to_major(),
            tax_id: account.tax_id.as_str().to_string(),
            name: account.name,
            created_at: account.created_at,
        }
    }
}

/// Response for a balance lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// Current balance in major units.
    pub balance: Decimal,
}

async fn create_account(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let balance = Money::from_major(body.balance).map_err(|e| ApiError::invalid(e.to_string()))?;

    let account = state
        .accounts
        .create_account(&body.name, &body.tax_id, balance)
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

async fn list_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    let accounts = state.accounts.list_accounts().await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

async fn get_balance(
    State(state): State<AppState>,
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let Path(account_id) = path?;
    let balance = state.accounts.get_balance(account_id).await?;
    Ok(Json(BalanceResponse {
        balance: balance.to_major(),
    }))
}
