//! Authentication and password hashing.
//!
//! This module provides:
//! - Argon2id credentials ([`Credential`])
//! - Registration, login and password resets ([`AuthService`])

mod password;
mod service;


pub use password::{Credential, MAX_PASSWORD_BYTES, PasswordError, check_plaintext};
pub use service::AuthService;

use pennywise_shared::AppError;

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Empty | PasswordError::TooLong => Self::Validation(err.to_string()),
            PasswordError::HashError(detail) => Self::Internal(detail),
        }
    }
}
