//! JWT token generation and validation.
//!
//! Tokens are HS256-signed and carry the user id, role, issuer and audience.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::auth::{Claims, Role};
use crate::config::JwtConfig;
use crate::types::UserId;

/// Minimum secret length: 256 bits.
pub const MIN_SECRET_BYTES: usize = 32;

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// No secret configured.
    #[error("signing secret is not configured")]
    MissingSecret,

    /// Secret contains whitespace or control characters.
    #[error("signing secret contains whitespace or control characters")]
    MalformedSecret,

    /// Secret shorter than 256 bits.
    #[error("signing secret must be at least {MIN_SECRET_BYTES} bytes, got {len}")]
    WeakSecret {
        /// Length of the rejected secret in bytes.
        len: usize,
    },

    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token decoded but its subject is not a user id.
    #[error("invalid token")]
    Invalid,
}

/// Checks that a signing secret is present, well-formed and long enough.
///
/// # Errors
///
/// Returns `MissingSecret`, `MalformedSecret` or `WeakSecret`.
pub fn validate_secret(secret: &str) -> Result<(), JwtError> {
    if secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }
    if secret.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(JwtError::MalformedSecret);
    }
    if secret.len() < MIN_SECRET_BYTES {
        return Err(JwtError::WeakSecret { len: secret.len() });
    }
    Ok(())
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service, refusing unusable secrets.
    ///
    /// # Errors
    ///
    /// Returns the [`validate_secret`] error for a bad secret.
    pub fn new(config: JwtConfig) -> Result<Self, JwtError> {
        validate_secret(&config.secret)?;
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Generates an access token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_access_token(&self, user_id: UserId, role: Role) -> Result<String, JwtError> {
        let expires_at = i64::try_from(self.config.access_token_expiry_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                JwtError::EncodingError(format!(
                    "token lifetime of {}s is out of range",
                    self.config.access_token_expiry_secs
                ))
            })?;
        let claims = Claims::new(
            user_id,
            role,
            &self.config.issuer,
            &self.config.audience,
            expires_at,
        );
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a token.
    ///
    /// Signature, expiry, issuer and audience are all checked, and the
    /// subject must parse as a user id.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::DecodingError` or `JwtError::Invalid` if the token is malformed.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })?;

        if claims.user_id().is_none() {
            return Err(JwtError::Invalid);
        }
        Ok(claims)
    }

    /// Returns the access token expiration in seconds.
    #[must_use]
    pub const fn access_token_expires_in(&self) -> u64 {
        self.config.access_token_expiry_secs
    }
}
