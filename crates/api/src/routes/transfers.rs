//! Transfer routes.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use bankwire_core::{Transfer, TransferRequest};
use bankwire_shared::types::{AccountId, Money, TransferId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::validate_positive_money;
use crate::{
    AppState,
    error::ApiError,
    extractors::{OptionalIdempotencyKey, ValidatedJson},
};

/// Creates the transfer routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/transfers", get(list_transfers).post(create_transfer))
}

/// Request body for a transfer.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_distinct_accounts", skip_on_field_errors = false))]
pub struct CreateTransferRequest {
    /// Account to debit.
    pub account_origin_id: Uuid,
    /// Account to credit.
    pub account_destination_id: Uuid,
    /// Amount in major units.
    #[validate(custom(
        function = "validate_positive_money",
        message = "amount must be positive with at most two decimal places"
    ))]
    pub amount: Decimal,
}

fn validate_distinct_accounts(body: &CreateTransferRequest) -> Result<(), ValidationError> {
    if body.account_origin_id == body.account_destination_id {
        return Err(ValidationError::new("same_account")
            .with_message("account origin equals destination account".into()));
    }
    Ok(())
}

/// Response for a transfer.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    /// Transfer ID.
    pub id: TransferId,
    /// Debited account.
    pub account_origin_id: AccountId,
    /// Credited account.
    pub account_destination_id: AccountId,
    /// Amount in major units.
    pub amount: Decimal,
    /// When the transfer was recorded.
    pub created_at: DateTime<Utc>,
}

impl From<Transfer> for TransferResponse {
    fn from(transfer: Transfer) -> Self {
        Self {
            id: transfer.id,
            account_origin_id: transfer.origin_account_id,
            account_destination_id: transfer.destination_account_id,
            amount: transfer.amount.to_major(),
            created_at: transfer.created_at,
        }
    }
}

async fn create_transfer(
    State(state): State<AppState>,
    OptionalIdempotencyKey(key): OptionalIdempotencyKey,
    ValidatedJson(body): ValidatedJson<CreateTransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), ApiError> {
    let amount = Money::from_major(body.amount).map_err(|e| ApiError::invalid(e.to_string()))?;

    let mut request = TransferRequest::new(
        AccountId::from_uuid(body.account_origin_id),
        AccountId::from_uuid(body.account_destination_id),
        amount,
    );
    if let Some(key) = key {
        request = request.with_idempotency_key(key);
    }

    let transfer = state.transfers.execute(request).await?;
    Ok((StatusCode::CREATED, Json(transfer.into())))
}

async fn list_transfers(
    State(state): State<AppState>,
) -> Result<Json<Vec<TransferResponse>>, ApiError> {
    let transfers = state.transfers.list_transfers().await?;
    Ok(Json(transfers.into_iter().map(Into::into).collect()))
}
