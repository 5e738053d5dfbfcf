//! Account repository backing `AccountStore`.

use async_trait::async_trait;
use bankwire_core::account::{Account, TaxId};
use bankwire_core::{AccountStore, StoreError};
use bankwire_shared::types::{AccountId, Money};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::debug;

use super::backend;
use crate::entities::accounts;

/// Account repository over PostgreSQL.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: accounts::Model) -> Result<Account, StoreError> {
    let tax_id = TaxId::parse(model.tax_id).map_err(|e| StoreError::backend(e.to_string()))?;
    Account::restore(
        AccountId::from_uuid(model.id),
        model.name,
        tax_id,
        Money::from_minor(model.balance),
        model.created_at.with_timezone(&Utc),
    )
    .map_err(|e| StoreError::backend(e.to_string()))
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn find_by_id(&self, id: AccountId) -> Result<Account, StoreError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(backend)?
            .ok_or(StoreError::AccountNotFound(id))
            .and_then(to_domain)
    }

    async fn find_all(&self) -> Result<Vec<Account>, StoreError> {
        accounts::Entity::find()
            .order_by_asc(accounts::Column::Name)
            .order_by_asc(accounts::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn find_balance(&self, id: AccountId) -> Result<Money, StoreError> {
        accounts::Entity::find_by_id(id.into_inner())
            .select_only()
            .column(accounts::Column::Balance)
            .into_tuple::<i64>()
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(Money::from_minor)
            .ok_or(StoreError::AccountNotFound(id))
    }

    async fn update_balance(
        &self,
        id: AccountId,
        expected: Money,
        new: Money,
    ) -> Result<(), StoreError> {
        // UPDATE accounts SET balance = $new WHERE id = $id AND balance = $expected
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(new.minor()))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .filter(accounts::Column::Balance.eq(expected.minor()))
            .exec(&self.db)
            .await
            .map_err(backend)?;

        if result.rows_affected > 0 {
            return Ok(());
        }

        let exists = accounts::Entity::find_by_id(id.into_inner())
            .count(&self.db)
            .await
            .map_err(backend)?
            > 0;

        if exists {
            debug!(account_id = %id, %expected, "Balance compare-and-swap lost");
            Err(StoreError::Conflict(id))
        } else {
            Err(StoreError::AccountNotFound(id))
        }
    }

    async fn store(&self, account: Account) -> Result<Account, StoreError> {
        let model = accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            name: Set(account.name.clone()),
            tax_id: Set(account.tax_id.as_str().to_string()),
            balance: Set(account.balance().minor()),
            created_at: Set(account.created_at.into()),
        };

        let inserted = model.insert(&self.db).await.map_err(backend)?;
        to_domain(inserted)
    }
}
