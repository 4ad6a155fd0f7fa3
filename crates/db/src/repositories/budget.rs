//! Budget repository for budget database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pennywise_core::budget::{Budget, BudgetDraft};
use pennywise_core::{ResourceStore, Scope, StoreError, StoreResult};
use pennywise_shared::types::{BudgetId, UserId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QueryTrait, Set,
};

use super::{amount, backend, classify, owner_filter};
use crate::entities::budgets;

/// Budget repository.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: budgets::Model) -> StoreResult<Budget> {
    Ok(Budget {
        id: model.id.into(),
        user_id: model.user_id.into(),
        category: model.category,
        amount: amount(model.amount)?,
        month_year: model.month_year,
        created_at: model.created_at.with_timezone(&Utc),
        version: model.version,
    })
}

#[async_trait]
impl ResourceStore<Budget> for BudgetRepository {
    async fn list(&self, scope: Scope) -> StoreResult<Vec<Budget>> {
        budgets::Entity::find()
            .apply_if(owner_filter(scope), |q, owner| {
                q.filter(budgets::Column::UserId.eq(owner))
            })
            .order_by_asc(budgets::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn find(&self, scope: Scope, id: BudgetId) -> StoreResult<Option<Budget>> {
        budgets::Entity::find_by_id(id.get())
            .apply_if(owner_filter(scope), |q, owner| {
                q.filter(budgets::Column::UserId.eq(owner))
            })
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(to_domain)
            .transpose()
    }

    async fn insert(
        &self,
        owner: UserId,
        draft: BudgetDraft,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Budget> {
        let model = budgets::ActiveModel {
            id: NotSet,
            user_id: Set(owner.get()),
            category: Set(draft.category),
            amount: Set(draft.amount.value()),
            month_year: Set(draft.month_year),
            created_at: Set(created_at.into()),
            version: Set(1),
        };

        let model = model.insert(&self.db).await.map_err(|e| {
            classify(
                e,
                StoreError::InvalidReference(format!("user {owner} does not exist")),
            )
        })?;
        to_domain(model)
    }

    async fn update(
        &self,
        scope: Scope,
        id: BudgetId,
        expected_version: i32,
        draft: BudgetDraft,
    ) -> StoreResult<Budget> {
        let changes = budgets::ActiveModel {
            category: Set(draft.category),
            amount: Set(draft.amount.value()),
            month_year: Set(draft.month_year),
            ..Default::default()
        };

        let updated = budgets::Entity::update_many()
            .set(changes)
            .col_expr(
                budgets::Column::Version,
                Expr::col(budgets::Column::Version).add(1),
            )
            .filter(budgets::Column::Id.eq(id.get()))
            .filter(budgets::Column::Version.eq(expected_version))
            .apply_if(owner_filter(scope), |q, owner| {
                q.filter(budgets::Column::UserId.eq(owner))
            })
            .exec_with_returning(&self.db)
            .await
            .map_err(backend)?;

        match updated.into_iter().next() {
            Some(model) => to_domain(model),
            // Lost the race or never visible: tell the two apart.
            None => match self.find(scope, id).await? {
                Some(_) => Err(StoreError::Conflict),
                None => Err(StoreError::NotFound),
            },
        }
    }

    async fn delete(&self, scope: Scope, id: BudgetId) -> StoreResult<()> {
        let result = budgets::Entity::delete_many()
            .filter(budgets::Column::Id.eq(id.get()))
            .apply_if(owner_filter(scope), |q, owner| {
                q.filter(budgets::Column::UserId.eq(owner))
            })
            .exec(&self.db)
            .await
            .map_err(|e| {
                classify(
                    e,
                    StoreError::Restricted("expenses still reference this budget".to_string()),
                )
            })?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
