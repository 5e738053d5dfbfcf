//! Transfer repository backing `TransferStore`.

use async_trait::async_trait;
use bankwire_core::{IdempotencyKey, RequestClaim, StoreError, Transfer, TransferStore};
use bankwire_shared::types::{AccountId, Money, TransferId};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::backend;
use crate::entities::{transfer_requests, transfers};

/// Transfer repository over PostgreSQL.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    db: DatabaseConnection,
}

impl TransferRepository {
    /// Creates a new transfer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: transfers::Model) -> Result<Transfer, StoreError> {
    let idempotency_key = match model.idempotency_key {
        Some(key) => Some(
            IdempotencyKey::new(key)
                .ok_or_else(|| StoreError::backend("stored idempotency key is invalid"))?,
        ),
        None => None,
    };

    Ok(Transfer {
        id: TransferId::from_uuid(model.id),
        origin_account_id: AccountId::from_uuid(model.origin_account_id),
        destination_account_id: AccountId::from_uuid(model.destination_account_id),
        amount: Money::from_minor(model.amount),
        idempotency_key,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[async_trait]
impl TransferStore for TransferRepository {
    async fn append(&self, transfer: Transfer) -> Result<Transfer, StoreError> {
        let txn = self.db.begin().await.map_err(backend)?;

        let inserted = transfers::ActiveModel {
            id: Set(transfer.id.into_inner()),
            origin_account_id: Set(transfer.origin_account_id.into_inner()),
            destination_account_id: Set(transfer.destination_account_id.into_inner()),
            amount: Set(transfer.amount.minor()),
            idempotency_key: Set(transfer.idempotency_key.as_ref().map(|k| k.as_str().to_string())),
            created_at: Set(transfer.created_at.into()),
        }
        .insert(&txn)
        .await
        .map_err(backend)?;

        // Complete the request slot in the same transaction as the record.
        if let Some(key) = &transfer.idempotency_key {
            transfer_requests::Entity::insert(transfer_requests::ActiveModel {
                key: Set(key.as_str().to_string()),
                transfer_id: Set(Some(inserted.id)),
                created_at: Set(Utc::now().into()),
            })
            .on_conflict(
                OnConflict::column(transfer_requests::Column::Key)
                    .update_column(transfer_requests::Column::TransferId)
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(backend)?;
        }

        txn.commit().await.map_err(backend)?;
        to_domain(inserted)
    }

    async fn find_all(&self) -> Result<Vec<Transfer>, StoreError> {
        transfers::Entity::find()
            .order_by_asc(transfers::Column::CreatedAt)
            .order_by_asc(transfers::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn claim_request(&self, key: &IdempotencyKey) -> Result<RequestClaim, StoreError> {
        let inserted = transfer_requests::Entity::insert(transfer_requests::ActiveModel {
            key: Set(key.as_str().to_string()),
            transfer_id: Set(None),
            created_at: Set(Utc::now().into()),
        })
        .on_conflict(
            OnConflict::column(transfer_requests::Column::Key)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .map_err(backend)?;

        if inserted == 1 {
            return Ok(RequestClaim::Claimed);
        }

        let existing = transfer_requests::Entity::find_by_id(key.as_str().to_string())
            .find_also_related(transfers::Entity)
            .one(&self.db)
            .await
            .map_err(backend)?;

        match existing {
            Some((_, Some(transfer))) => Ok(RequestClaim::Completed(to_domain(transfer)?)),
            // Either still held, or released between the insert and this read.
            Some((_, None)) | None => Ok(RequestClaim::InFlight),
        }
    }

    async fn release_request(&self, key: &IdempotencyKey) -> Result<(), StoreError> {
        transfer_requests::Entity::delete_many()
            .filter(transfer_requests::Column::Key.eq(key.as_str()))
            .filter(transfer_requests::Column::TransferId.is_null())
            .exec(&self.db)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
