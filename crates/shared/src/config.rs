//! Application configuration management.

use serde::Deserialize;
use thiserror::Error;

use crate::jwt::{JwtError, validate_secret};

/// Longest accepted access-token lifetime, in seconds (`i32::MAX`).
pub const MAX_TOKEN_EXPIRY_SECS: u64 = 2_147_483_647;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    #[serde(default)]
    pub jwt: JwtConfig,
    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Requests running longer than this are aborted.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens (at least 32 bytes).
    #[serde(default)]
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
    /// `iss` claim written and required.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// `aud` claim written and required.
    #[serde(default = "default_audience")]
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_expiry_secs: default_access_token_expiry(),
            issuer: default_issuer(),
            audience: default_audience(),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[hidden]")
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

fn default_access_token_expiry() -> u64 {
    3600 // 1 hour
}

fn default_issuer() -> String {
    "pennywise".to_string()
}

fn default_audience() -> String {
    "pennywise-web".to_string()
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Exact origins allowed to call the API with credentials.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Sources could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The JWT signing secret is unusable.
    #[error("invalid jwt.secret: {0}")]
    JwtSecret(#[from] JwtError),

    /// Token lifetime is zero or too large to add to the current time.
    #[error("jwt.access_token_expiry_secs must be between 1 and {MAX_TOKEN_EXPIRY_SECS}, got {0}")]
    TokenExpiry(u64),

    /// Credentials are allowed, so the origin list must be explicit.
    #[error("cors.allowed_origins must list at least one origin")]
    NoCorsOrigins,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones:
    /// `config/default`, `config/{RUN_MODE}`, then `PENNYWISE__*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("PENNYWISE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Loads and validates in one step; the server calls this at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or [`AppConfig::validate`] rejects the result.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the server must not start with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::JwtSecret` for an absent, malformed or short secret
    /// and `ConfigError::NoCorsOrigins` for an empty origin list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_secret(&self.jwt.secret)?;
        let expiry = self.jwt.access_token_expiry_secs;
        if !(1..=MAX_TOKEN_EXPIRY_SECS).contains(&expiry) {
            return Err(ConfigError::TokenExpiry(expiry));
        }
        if self.cors.allowed_origins.iter().all(|o| o.trim().is_empty()) {
            return Err(ConfigError::NoCorsOrigins);
        }
        Ok(())
    }
}
