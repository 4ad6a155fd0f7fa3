//! Profile and user-management operations.

use std::sync::Arc;

use pennywise_shared::types::UserId;
use pennywise_shared::{AppError, AppResult};
use tracing::info;

use super::{AdminUserUpdate, ProfileUpdate, Registration, User, UserChanges};
use crate::auth::AuthService;
use crate::clock::Clock;
use crate::notification::PROFILE_UPDATED;
use crate::store::{Notice, StoreError, UserStore};

/// User service.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    auth: AuthService,
    clock: Arc<dyn Clock>,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Self {
        let auth = AuthService::new(Arc::clone(&users), Arc::clone(&clock));
        Self { users, auth, clock }
    }

    /// The caller's own account.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the account was deleted.
    pub async fn profile(&self, user_id: UserId) -> AppResult<User> {
        self.get(user_id).await
    }

    /// Updates the caller's profile and records a notification, atomically.
    ///
    /// # Errors
    ///
    /// - `AppError::Validation` for malformed fields
    /// - `AppError::Conflict` if the email is taken or the version moved
    /// - `AppError::NotFound` if the account was deleted
    pub async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> AppResult<User> {
        let version = update.version;
        let user = self.apply(user_id, version, update.into_changes(None)?).await?;
        info!(user_id = %user_id, "Profile updated");
        Ok(user)
    }

    /// Every account (administrators).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.users.list().await.map_err(|e| e.into_app_error("User"))
    }

    /// One account.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if absent.
    pub async fn get(&self, user_id: UserId) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(|e| e.into_app_error("User"))?
            .ok_or_else(|| not_found(user_id))
    }

    /// Creates an account on behalf of an administrator.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    pub async fn create(&self, registration: Registration, password: &str) -> AppResult<User> {
        self.auth.register(registration, password).await
    }

    /// Overwrites profile fields and role. A supplied password is hashed by
    /// [`AuthService::reset_credential`] and stored in the same write.
    ///
    /// # Errors
    ///
    /// - `AppError::Validation` if the body id is missing or differs, or a field is invalid
    /// - `AppError::NotFound` if the account is absent
    /// - `AppError::Conflict` if the email is taken or the version moved
    pub async fn update(&self, user_id: UserId, update: AdminUserUpdate) -> AppResult<User> {
        match update.id {
            Some(body_id) if body_id == user_id => {}
            Some(body_id) => {
                return Err(AppError::Validation(format!(
                    "User id in body ({body_id}) does not match the path ({user_id})"
                )));
            }
            None => {
                return Err(AppError::Validation(
                    "User id is required in the body".to_string(),
                ));
            }
        }
        let version = update.profile.version;
        let mut changes = update.profile.into_changes(update.role)?;
        changes.credential = update
            .password
            .as_deref()
            .map(AuthService::reset_credential)
            .transpose()?;
        let user = self.apply(user_id, version, changes).await?;

        info!(user_id = %user_id, role = %user.role, "User updated by administrator");
        Ok(user)
    }

    /// Deletes an account and everything it owns.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if absent.
    pub async fn delete(&self, user_id: UserId) -> AppResult<()> {
        self.users.delete(user_id).await.map_err(|e| match e {
            StoreError::NotFound => not_found(user_id),
            other => other.into_app_error("User"),
        })?;
        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    async fn apply(
        &self,
        user_id: UserId,
        expected_version: Option<i32>,
        changes: UserChanges,
    ) -> AppResult<User> {
        let expected_version = match expected_version {
            Some(version) => version,
            None => self.get(user_id).await?.version,
        };
        let notice = Notice {
            message: PROFILE_UPDATED.to_string(),
            created_at: self.clock.now(),
        };

        self.users
            .update(user_id, expected_version, changes, Some(notice))
            .await
            .map_err(|e| match e {
                StoreError::NotFound => not_found(user_id),
                StoreError::Duplicate(_) => {
                    AppError::Conflict("Email is already registered".to_string())
                }
                other => other.into_app_error("User"),
            })
    }
}

fn not_found(user_id: UserId) -> AppError {
    AppError::NotFound(format!("User {user_id} not found"))
}
