//! User repository for database operations.

use async_trait::async_trait;
use chrono::Utc;
use pennywise_core::auth::Credential;
use pennywise_core::store::Notice;
use pennywise_core::user::{NewUser, StoredUser, User, UserChanges};
use pennywise_core::{StoreError, StoreResult, UserStore};
use pennywise_shared::types::UserId;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{backend, classify};
use crate::entities::{notifications, users};

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_user(model: &users::Model) -> User {
    User {
        id: model.id.into(),
        email: model.email.clone(),
        role: model.role.into(),
        first_name: model.first_name.clone(),
        last_name: model.last_name.clone(),
        gender: model.gender.into(),
        created_at: model.created_at.with_timezone(&Utc),
        version: model.version,
    }
}

fn to_stored(model: users::Model) -> StoredUser {
    StoredUser {
        user: to_user(&model),
        credential: Credential::from_phc(model.password_hash),
    }
}

/// Inserts a notification inside the caller's transaction.
async fn insert_notice<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    notice: Notice,
) -> StoreResult<()> {
    notifications::ActiveModel {
        id: NotSet,
        user_id: Set(user_id.get()),
        message: Set(notice.message),
        is_read: Set(false),
        created_at: Set(notice.created_at.into()),
        version: Set(1),
    }
    .insert(db)
    .await
    .map_err(backend)?;
    Ok(())
}

#[async_trait]
impl UserStore for UserRepository {
    async fn list(&self) -> StoreResult<Vec<User>> {
        let rows = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.iter().map(to_user).collect())
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = users::Entity::find_by_id(id.get())
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(row.as_ref().map(to_user))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<StoredUser>> {
        let row = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(row.map(to_stored))
    }

    async fn find_stored(&self, id: UserId) -> StoreResult<Option<StoredUser>> {
        let row = users::Entity::find_by_id(id.get())
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(row.map(to_stored))
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await
            .map_err(backend)?;

        Ok(count > 0)
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let model = users::ActiveModel {
            id: NotSet,
            email: Set(user.email),
            password_hash: Set(user.credential.as_phc().to_string()),
            role: Set(user.role.into()),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            gender: Set(user.gender.into()),
            created_at: Set(user.created_at.into()),
            version: Set(1),
        };

        let model = model
            .insert(&self.db)
            .await
            .map_err(|e| classify(e, StoreError::Backend("unexpected reference".to_string())))?;
        Ok(to_user(&model))
    }

    async fn update(
        &self,
        id: UserId,
        expected_version: i32,
        changes: UserChanges,
        notice: Option<Notice>,
    ) -> StoreResult<User> {
        let txn = self.db.begin().await.map_err(backend)?;

        let active = users::ActiveModel {
            email: Set(changes.email),
            first_name: Set(changes.first_name),
            last_name: Set(changes.last_name),
            gender: Set(changes.gender.into()),
            role: changes.role.map_or(NotSet, |role| Set(role.into())),
            password_hash: changes
                .credential
                .map_or(NotSet, |credential| Set(credential.as_phc().to_string())),
            ..Default::default()
        };

        let updated = users::Entity::update_many()
            .set(active)
            .col_expr(
                users::Column::Version,
                Expr::col(users::Column::Version).add(1),
            )
            .filter(users::Column::Id.eq(id.get()))
            .filter(users::Column::Version.eq(expected_version))
            .exec_with_returning(&txn)
            .await
            .map_err(|e| classify(e, StoreError::Backend("unexpected reference".to_string())))?;

        let Some(model) = updated.into_iter().next() else {
            let exists = users::Entity::find_by_id(id.get())
                .one(&txn)
                .await
                .map_err(backend)?
                .is_some();
            return Err(if exists {
                StoreError::Conflict
            } else {
                StoreError::NotFound
            });
        };

        if let Some(notice) = notice {
            insert_notice(&txn, id, notice).await?;
        }
        txn.commit().await.map_err(backend)?;

        Ok(to_user(&model))
    }

    async fn set_credential(
        &self,
        id: UserId,
        credential: &Credential,
        notice: Option<Notice>,
    ) -> StoreResult<()> {
        let txn = self.db.begin().await.map_err(backend)?;

        let result = users::Entity::update_many()
            .col_expr(
                users::Column::PasswordHash,
                Expr::value(credential.as_phc().to_string()),
            )
            .filter(users::Column::Id.eq(id.get()))
            .exec(&txn)
            .await
            .map_err(backend)?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        if let Some(notice) = notice {
            insert_notice(&txn, id, notice).await?;
        }
        txn.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn delete(&self, id: UserId) -> StoreResult<()> {
        let result = users::Entity::delete_by_id(id.get())
            .exec(&self.db)
            .await
            .map_err(backend)?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
