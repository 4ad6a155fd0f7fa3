//! Password credentials hashed with Argon2id.
//!
//! A [`Credential`] only ever holds a PHC string; the plaintext never leaves
//! [`Credential::derive`] and [`Credential::verify`].

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Longest accepted password, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 128;

/// Errors that can occur during password operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    /// Empty password.
    #[error("password is required")]
    Empty,

    /// Password above `MAX_PASSWORD_BYTES`.
    #[error("password must be at most {MAX_PASSWORD_BYTES} bytes")]
    TooLong,

    /// Failed to hash password.
    #[error("failed to hash password: {0}")]
    HashError(String),
}

/// A stored password digest in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([redacted])")
    }
}

impl Credential {
    /// Hashes a plaintext password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::Empty` or `PasswordError::TooLong` for
    /// unacceptable input, `PasswordError::HashError` if hashing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use pennywise_core::auth::Credential;
    ///
    /// let credential = Credential::derive("my_secure_password").unwrap();
    /// assert!(credential.as_phc().starts_with("$argon2id$"));
    /// ```
    pub fn derive(plaintext: &str) -> Result<Self, PasswordError> {
        check_plaintext(plaintext)?;
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| Self(hash.to_string()))
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    /// Wraps a PHC string loaded from storage.
    #[must_use]
    pub const fn from_phc(phc: String) -> Self {
        Self(phc)
    }

    /// The PHC string, for persisting.
    #[must_use]
    pub fn as_phc(&self) -> &str {
        &self.0
    }

    /// Returns true if `plaintext` matches.
    ///
    /// An unparseable stored digest never verifies.
    ///
    /// ```
    /// use pennywise_core::auth::Credential;
    ///
    /// let credential = Credential::derive("my_password").unwrap();
    /// assert!(credential.verify("my_password"));
    /// assert!(!credential.verify("wrong_password"));
    /// ```
    #[must_use]
    pub fn verify(&self, plaintext: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.0) else {
            tracing::warn!("Stored credential is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Checks a plaintext password before hashing.
///
/// # Errors
///
/// Returns `PasswordError::Empty` or `PasswordError::TooLong`.
pub fn check_plaintext(plaintext: &str) -> Result<(), PasswordError> {
    if plaintext.is_empty() {
        return Err(PasswordError::Empty);
    }
    if plaintext.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_produces_phc() {
        let password = "test_password_123!";
        let credential = Credential::derive(password).unwrap();

        // Hash should be in PHC format
        assert!(credential.as_phc().starts_with("$argon2id$"));
        assert_ne!(credential.as_phc(), password);
    }

    #[test]
    fn test_verify_correct_password() {
        let credential = Credential::derive("correct_password").unwrap();
        assert!(credential.verify("correct_password"));
    }

    #[test]
    fn test_verify_wrong_password() {
        let credential = Credential::derive("correct_password").unwrap();
        assert!(!credential.verify("wrong_password"));
    }

    #[test]
    fn test_same_password_different_salts() {
        let first = Credential::derive("password1").unwrap();
        let second = Credential::derive("password1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalid_phc_never_verifies() {
        let credential = Credential::from_phc("invalid_hash".to_string());
        assert!(!credential.verify("invalid_hash"));
    }

    #[test]
    fn test_empty_and_oversized_rejected() {
        assert_eq!(Credential::derive(""), Err(PasswordError::Empty));
        let long = "p".repeat(MAX_PASSWORD_BYTES + 1);
        assert_eq!(Credential::derive(&long), Err(PasswordError::TooLong));
    }

    #[test]
    fn test_debug_is_redacted() {
        let credential = Credential::derive("hunter22").unwrap();
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("argon2"));
        assert!(rendered.contains("redacted"));
    }
}
