//! Persistence ports.
//!
//! Services talk to storage only through these traits. `pennywise-db`
//! implements them over PostgreSQL; the `memory` module implements them over
//! in-process maps with the same constraint semantics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pennywise_shared::AppError;
use pennywise_shared::types::UserId;
use thiserror::Error;

use crate::auth::Credential;
use crate::resource::{Resource, Scope};
use crate::user::{NewUser, StoredUser, User, UserChanges};

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No row matched (missing, or outside the caller's scope).
    #[error("record not found")]
    NotFound,

    /// The row exists but its concurrency token moved.
    #[error("record was modified concurrently")]
    Conflict,

    /// Delete blocked by dependent rows.
    #[error("record is still referenced: {0}")]
    Restricted(String),

    /// Unique constraint violated.
    #[error("duplicate value: {0}")]
    Duplicate(String),

    /// A foreign key points at nothing, or at a row of another owner.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// Anything else; never shown to clients.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Converts to an `AppError`, naming the record for client-facing kinds.
    #[must_use]
    pub fn into_app_error(self, what: &str) -> AppError {
        match self {
            Self::NotFound => AppError::NotFound(format!("{what} not found")),
            Self::Conflict => AppError::Conflict(format!(
                "{what} was modified by another request; reload and retry"
            )),
            Self::Restricted(detail) => {
                AppError::Conflict(format!("{what} is still in use: {detail}"))
            }
            Self::Duplicate(detail) => AppError::Conflict(detail),
            Self::InvalidReference(detail) => AppError::Validation(detail),
            Self::Backend(detail) => AppError::Database(detail),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        err.into_app_error("record")
    }
}

/// A notification written in the same transaction as a user change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Notification text.
    pub message: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Owner-scoped storage for one resource type.
#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync {
    /// All rows visible in `scope`, ordered by id.
    async fn list(&self, scope: Scope) -> StoreResult<Vec<R>>;

    /// One row, if it exists and is visible in `scope`.
    async fn find(&self, scope: Scope, id: R::Id) -> StoreResult<Option<R>>;

    /// Inserts a row owned by `owner` with version 1.
    ///
    /// `InvalidReference` if `owner` (or any other reference) does not resolve.
    async fn insert(
        &self,
        owner: UserId,
        draft: R::Draft,
        created_at: DateTime<Utc>,
    ) -> StoreResult<R>;

    /// Replaces the mutable fields if the stored version equals `expected_version`.
    ///
    /// On a miss the row is re-read: `NotFound` if it is gone (or out of
    /// scope), `Conflict` if it exists with another version.
    async fn update(
        &self,
        scope: Scope,
        id: R::Id,
        expected_version: i32,
        draft: R::Draft,
    ) -> StoreResult<R>;

    /// Removes the row. `NotFound` if absent or out of scope, `Restricted`
    /// if dependents block it.
    async fn delete(&self, scope: Scope, id: R::Id) -> StoreResult<()>;
}

/// User accounts and their credentials.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users, ordered by id.
    async fn list(&self) -> StoreResult<Vec<User>>;

    /// User by id.
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    /// User plus credential by (already normalized) email.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<StoredUser>>;

    /// User plus credential by id.
    async fn find_stored(&self, id: UserId) -> StoreResult<Option<StoredUser>>;

    /// Whether a user with this (normalized) email exists.
    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    /// Inserts a user. `Duplicate` if the email is taken.
    async fn insert(&self, user: NewUser) -> StoreResult<User>;

    /// Applies `changes` (including a replacement credential) if the version
    /// matches, and writes `notice` in the same transaction.
    async fn update(
        &self,
        id: UserId,
        expected_version: i32,
        changes: UserChanges,
        notice: Option<Notice>,
    ) -> StoreResult<User>;

    /// Replaces the credential, and writes `notice` in the same transaction.
    async fn set_credential(
        &self,
        id: UserId,
        credential: &Credential,
        notice: Option<Notice>,
    ) -> StoreResult<()>;

    /// Deletes the user and, by cascade, everything it owns.
    async fn delete(&self, id: UserId) -> StoreResult<()>;
}
