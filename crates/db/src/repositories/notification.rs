//! Notification repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pennywise_core::notification::{Notification, NotificationDraft};
use pennywise_core::{ResourceStore, Scope, StoreError, StoreResult};
use pennywise_shared::types::{NotificationId, UserId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QueryTrait, Set,
};

use super::{backend, classify, owner_filter};
use crate::entities::notifications;

/// Notification repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub(crate) fn to_domain(model: notifications::Model) -> Notification {
    Notification {
        id: model.id.into(),
        user_id: model.user_id.into(),
        message: model.message,
        is_read: model.is_read,
        created_at: model.created_at.with_timezone(&Utc),
        version: model.version,
    }
}

#[async_trait]
impl ResourceStore<Notification> for NotificationRepository {
    async fn list(&self, scope: Scope) -> StoreResult<Vec<Notification>> {
        let rows = notifications::Entity::find()
            .apply_if(owner_filter(scope), |q, owner| {
                q.filter(notifications::Column::UserId.eq(owner))
            })
            .order_by_asc(notifications::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(to_domain).collect())
    }

    async fn find(&self, scope: Scope, id: NotificationId) -> StoreResult<Option<Notification>> {
        let row = notifications::Entity::find_by_id(id.get())
            .apply_if(owner_filter(scope), |q, owner| {
                q.filter(notifications::Column::UserId.eq(owner))
            })
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(row.map(to_domain))
    }

    async fn insert(
        &self,
        owner: UserId,
        draft: NotificationDraft,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Notification> {
        let model = notifications::ActiveModel {
            id: NotSet,
            user_id: Set(owner.get()),
            message: Set(draft.message),
            is_read: Set(draft.is_read),
            created_at: Set(created_at.into()),
            version: Set(1),
        };

        model
            .insert(&self.db)
            .await
            .map(to_domain)
            .map_err(|e| {
                classify(
                    e,
                    StoreError::InvalidReference(format!("user {owner} does not exist")),
                )
            })
    }

    async fn update(
        &self,
        scope: Scope,
        id: NotificationId,
        expected_version: i32,
        draft: NotificationDraft,
    ) -> StoreResult<Notification> {
        let changes = notifications::ActiveModel {
            message: Set(draft.message),
            is_read: Set(draft.is_read),
            ..Default::default()
        };

        let updated = notifications::Entity::update_many()
            .set(changes)
            .col_expr(
                notifications::Column::Version,
                Expr::col(notifications::Column::Version).add(1),
            )
            .filter(notifications::Column::Id.eq(id.get()))
            .filter(notifications::Column::Version.eq(expected_version))
            .apply_if(owner_filter(scope), |q, owner| {
                q.filter(notifications::Column::UserId.eq(owner))
            })
            .exec_with_returning(&self.db)
            .await
            .map_err(backend)?;

        match updated.into_iter().next() {
            Some(model) => Ok(to_domain(model)),
            None => match self.find(scope, id).await? {
                Some(_) => Err(StoreError::Conflict),
                None => Err(StoreError::NotFound),
            },
        }
    }

    async fn delete(&self, scope: Scope, id: NotificationId) -> StoreResult<()> {
        let result = notifications::Entity::delete_many()
            .filter(notifications::Column::Id.eq(id.get()))
            .apply_if(owner_filter(scope), |q, owner| {
                q.filter(notifications::Column::UserId.eq(owner))
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
