//! Expense repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pennywise_core::expense::{Expense, ExpenseDraft};
use pennywise_core::{ResourceStore, Scope, StoreError, StoreResult};
use pennywise_shared::types::{ExpenseId, UserId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QueryTrait, Set,
};

use super::{amount, backend, classify, owner_filter};
use crate::entities::expenses;

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: expenses::Model) -> StoreResult<Expense> {
    Ok(Expense {
        id: model.id.into(),
        user_id: model.user_id.into(),
        budget_id: model.budget_id.map(Into::into),
        category: model.category,
        amount: amount(model.amount)?,
        date: model.date,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
        version: model.version,
    })
}

fn dangling(draft_budget: Option<i32>) -> StoreError {
    match draft_budget {
        Some(budget_id) => StoreError::InvalidReference(format!(
            "budget {budget_id} does not exist for this user"
        )),
        None => StoreError::InvalidReference("owner does not exist".to_string()),
    }
}

#[async_trait]
impl ResourceStore<Expense> for ExpenseRepository {
    async fn list(&self, scope: Scope) -> StoreResult<Vec<Expense>> {
        expenses::Entity::find()
            .apply_if(owner_filter(scope), |q, owner| {
                q.filter(expenses::Column::UserId.eq(owner))
            })
            .order_by_asc(expenses::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn find(&self, scope: Scope, id: ExpenseId) -> StoreResult<Option<Expense>> {
        expenses::Entity::find_by_id(id.get())
            .apply_if(owner_filter(scope), |q, owner| {
                q.filter(expenses::Column::UserId.eq(owner))
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
        draft: ExpenseDraft,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Expense> {
        let budget_id = draft.budget_id.map(|id| id.get());
        let model = expenses::ActiveModel {
            id: NotSet,
            user_id: Set(owner.get()),
            budget_id: Set(budget_id),
            category: Set(draft.category),
            amount: Set(draft.amount.value()),
            date: Set(draft.date),
            description: Set(draft.description),
            created_at: Set(created_at.into()),
            version: Set(1),
        };

        let model = model
            .insert(&self.db)
            .await
            .map_err(|e| classify(e, dangling(budget_id)))?;
        to_domain(model)
    }

    async fn update(
        &self,
        scope: Scope,
        id: ExpenseId,
        expected_version: i32,
        draft: ExpenseDraft,
    ) -> StoreResult<Expense> {
        let budget_id = draft.budget_id.map(|id| id.get());
        let changes = expenses::ActiveModel {
            budget_id: Set(budget_id),
            category: Set(draft.category),
            amount: Set(draft.amount.value()),
            date: Set(draft.date),
            description: Set(draft.description),
            ..Default::default()
        };

        let updated = expenses::Entity::update_many()
            .set(changes)
            .col_expr(
                expenses::Column::Version,
                Expr::col(expenses::Column::Version).add(1),
            )
            .filter(expenses::Column::Id.eq(id.get()))
            .filter(expenses::Column::Version.eq(expected_version))
            .apply_if(owner_filter(scope), |q, owner| {
                q.filter(expenses::Column::UserId.eq(owner))
            })
            .exec_with_returning(&self.db)
            .await
            .map_err(|e| classify(e, dangling(budget_id)))?;

        match updated.into_iter().next() {
            Some(model) => to_domain(model),
            None => match self.find(scope, id).await? {
                Some(_) => Err(StoreError::Conflict),
                None => Err(StoreError::NotFound),
            },
        }
    }

    async fn delete(&self, scope: Scope, id: ExpenseId) -> StoreResult<()> {
        let result = expenses::Entity::delete_many()
            .filter(expenses::Column::Id.eq(id.get()))
            .apply_if(owner_filter(scope), |q, owner| {
                q.filter(expenses::Column::UserId.eq(owner))
            })
            .exec(&self.db)
            .await
            .map_err(backend)?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
