//! Registration, login and credential management.

use std::sync::Arc;

use pennywise_shared::types::UserId;
use pennywise_shared::{AppError, AppResult};
use tracing::{info, warn};

use super::Credential;
use crate::clock::Clock;
use crate::notification::PASSWORD_CHANGED;
use crate::store::{Notice, StoreError, UserStore};
use crate::user::{NewUser, Registration, User, normalize_email, normalize_name};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    /// Creates a new authentication service.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }

    /// Creates an account with a freshly hashed credential.
    ///
    /// # Errors
    ///
    /// - `AppError::Validation` for an empty password or malformed email
    /// - `AppError::Conflict` if the email is already registered
    pub async fn register(&self, candidate: Registration, plaintext: &str) -> AppResult<User> {
        let email = normalize_email(&candidate.email)?;
        let first_name = normalize_name("firstName", &candidate.first_name)?;
        let last_name = normalize_name("lastName", &candidate.last_name)?;
        let credential = Credential::derive(plaintext)?;

        if self.user_exists(&email).await? {
            warn!(email = %email, "Registration for existing email");
            return Err(duplicate_email());
        }

        let user = self
            .users
            .insert(NewUser {
                email,
                credential,
                role: candidate.role,
                first_name,
                last_name,
                gender: candidate.gender,
                created_at: self.clock.now(),
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => duplicate_email(),
                other => other.into_app_error("User"),
            })?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Checks an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` with the same message whether the
    /// account is missing or the password is wrong.
    pub async fn login(&self, email: &str, plaintext: &str) -> AppResult<User> {
        let email = email.trim().to_lowercase();
        let stored = self
            .users
            .find_by_email(&email)
            .await
            .map_err(|e| e.into_app_error("User"))?;

        match stored {
            Some(stored) if stored.credential.verify(plaintext) => {
                info!(user_id = %stored.user.id, "User logged in");
                Ok(stored.user)
            }
            Some(stored) => {
                warn!(user_id = %stored.user.id, "Login with wrong password");
                Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))
            }
            None => {
                warn!(email = %email, "Login attempt for non-existent user");
                Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))
            }
        }
    }

    /// Returns true if an account uses this email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn user_exists(&self, email: &str) -> AppResult<bool> {
        let email = email.trim().to_lowercase();
        self.users
            .email_exists(&email)
            .await
            .map_err(|e| e.into_app_error("User"))
    }

    /// Replaces the credential of the account with this email.
    ///
    /// # Errors
    ///
    /// - `AppError::Validation` for an unacceptable password
    /// - `AppError::NotFound` if no such account exists
    pub async fn reset_password(&self, email: &str, new_plaintext: &str) -> AppResult<()> {
        let credential = Self::reset_credential(new_plaintext)?;
        let email = email.trim().to_lowercase();
        let stored = self
            .users
            .find_by_email(&email)
            .await
            .map_err(|e| e.into_app_error("User"))?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.users
            .set_credential(stored.user.id, &credential, None)
            .await
            .map_err(|e| e.into_app_error("User"))?;

        info!(user_id = %stored.user.id, "Password reset");
        Ok(())
    }

    /// Hashes a replacement password without storing it, for callers that
    /// persist it together with other changes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an unacceptable password.
    pub fn reset_credential(new_plaintext: &str) -> AppResult<Credential> {
        Ok(Credential::derive(new_plaintext)?)
    }

    /// Replaces the caller's own credential after re-checking the current one.
    ///
    /// A "password changed" notification is written in the same transaction.
    ///
    /// # Errors
    ///
    /// - `AppError::Unauthorized` if `current` does not verify
    /// - `AppError::Validation` for an unacceptable new password
    /// - `AppError::NotFound` if the account no longer exists
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: &str,
        new_plaintext: &str,
    ) -> AppResult<()> {
        let stored = self
            .users
            .find_stored(user_id)
            .await
            .map_err(|e| e.into_app_error("User"))?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !stored.credential.verify(current) {
            warn!(user_id = %user_id, "Password change with wrong current password");
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let credential = Credential::derive(new_plaintext)?;
        let notice = Notice {
            message: PASSWORD_CHANGED.to_string(),
            created_at: self.clock.now(),
        };
        self.users
            .set_credential(user_id, &credential, Some(notice))
            .await
            .map_err(|e| e.into_app_error("User"))?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}

fn duplicate_email() -> AppError {
    AppError::Conflict("Email is already registered".to_string())
}
