//! Generic CRUD over owner-scoped resources.

use std::sync::Arc;

use pennywise_shared::types::UserId;
use pennywise_shared::{AppError, AppResult};
use tracing::{info, warn};

use super::{Resource, Scope};
use crate::clock::Clock;
use crate::store::{ResourceStore, StoreError};

/// An update request: the body's id and version plus the new field values.
#[derive(Debug, Clone)]
pub struct Update<R: Resource> {
    /// Id repeated in the body; must equal the path id.
    pub id: Option<R::Id>,
    /// Expected concurrency token. When absent the current version is used.
    pub version: Option<i32>,
    /// Replacement field values.
    pub draft: R::Draft,
}

/// Service enforcing ownership scoping for one resource type.
pub struct ScopedService<R: Resource> {
    store: Arc<dyn ResourceStore<R>>,
    clock: Arc<dyn Clock>,
}

impl<R: Resource> Clone for ScopedService<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R: Resource> ScopedService<R> {
    /// Creates a new scoped service.
    #[must_use]
    pub fn new(store: Arc<dyn ResourceStore<R>>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Lists every row visible in `scope`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn list(&self, scope: Scope) -> AppResult<Vec<R>> {
        self.store.list(scope).await.map_err(Self::map_err)
    }

    /// Fetches one row.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the row is absent or outside `scope`.
    pub async fn get(&self, scope: Scope, id: R::Id) -> AppResult<R> {
        self.store
            .find(scope, id)
            .await
            .map_err(Self::map_err)?
            .ok_or_else(|| Self::not_found(id))
    }

    /// Validates and persists a new row owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for bad fields or an unresolvable
    /// reference.
    pub async fn create(&self, owner: UserId, draft: R::Draft) -> AppResult<R> {
        let draft = R::validate(draft)?;
        let row = self
            .store
            .insert(owner, draft, self.clock.now())
            .await
            .map_err(Self::map_err)?;

        info!(kind = R::KIND, id = %row.id(), owner = %owner, "Created");
        Ok(row)
    }

    /// Replaces the mutable fields of a row.
    ///
    /// The body id is checked against `path_id` before the store is touched.
    ///
    /// # Errors
    ///
    /// - `AppError::Validation` if the body id is missing or differs, or a field is invalid
    /// - `AppError::NotFound` if the row is absent or outside `scope`
    /// - `AppError::Conflict` if the version moved underneath the caller
    pub async fn update(&self, scope: Scope, path_id: R::Id, update: Update<R>) -> AppResult<R> {
        match update.id {
            Some(body_id) if body_id == path_id => {}
            Some(body_id) => {
                return Err(AppError::Validation(format!(
                    "{} id in body ({body_id}) does not match the path ({path_id})",
                    R::KIND
                )));
            }
            None => {
                return Err(AppError::Validation(format!(
                    "{} id is required in the body",
                    R::KIND
                )));
            }
        }
        let draft = R::validate(update.draft)?;

        let expected_version = match update.version {
            Some(version) => version,
            None => self.get(scope, path_id).await?.version(),
        };

        let row = self
            .store
            .update(scope, path_id, expected_version, draft)
            .await
            .map_err(|e| Self::map_err_for(e, path_id))?;

        info!(kind = R::KIND, id = %path_id, version = row.version(), "Updated");
        Ok(row)
    }

    /// Deletes a row permanently.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` if the row is absent or outside `scope`
    /// - `AppError::Conflict` if other rows still reference it
    pub async fn delete(&self, scope: Scope, id: R::Id) -> AppResult<()> {
        self.store
            .delete(scope, id)
            .await
            .map_err(|e| Self::map_err_for(e, id))?;

        info!(kind = R::KIND, id = %id, "Deleted");
        Ok(())
    }

    fn not_found(id: R::Id) -> AppError {
        AppError::NotFound(format!("{} {id} not found", R::KIND))
    }

    fn map_err_for(err: StoreError, id: R::Id) -> AppError {
        match err {
            StoreError::NotFound => Self::not_found(id),
            StoreError::Conflict => {
                warn!(kind = R::KIND, id = %id, "Concurrent modification");
                err.into_app_error(R::KIND)
            }
            other => Self::map_err(other),
        }
    }

    fn map_err(err: StoreError) -> AppError {
        err.into_app_error(R::KIND)
    }
}
