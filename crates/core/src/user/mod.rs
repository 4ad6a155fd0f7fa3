//! User accounts, profiles and administrator user management.

mod service;

#[cfg(test)]
mod tests;

pub use service::UserService;

use chrono::{DateTime, Utc};
use pennywise_shared::auth::Role;
use pennywise_shared::types::UserId;
use pennywise_shared::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::auth::Credential;

/// Longest accepted email address.
pub const MAX_EMAIL_CHARS: usize = 254;

/// Longest accepted first or last name.
pub const MAX_NAME_CHARS: usize = 100;

/// Self-described gender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Other.
    Other,
    /// Not given.
    #[default]
    Unspecified,
}

impl Gender {
    /// Stable string form used in the database and exports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::Unspecified => "unspecified",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            "unspecified" | "" => Ok(Self::Unspecified),
            _ => Err(format!("Unknown gender: {s}")),
        }
    }
}

/// A user account as exposed to clients. Never carries the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID.
    #[serde(rename = "userID")]
    pub id: UserId,
    /// Lower-cased email.
    pub email: String,
    /// Account role.
    pub role: Role,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Self-described gender.
    pub gender: Gender,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Concurrency token.
    pub version: i32,
}

/// A user together with its stored credential.
#[derive(Debug, Clone)]
pub struct StoredUser {
    /// Public fields.
    pub user: User,
    /// Password digest.
    pub credential: Credential,
}

/// Everything needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Normalized email.
    pub email: String,
    /// Password digest.
    pub credential: Credential,
    /// Account role.
    pub role: Role,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Self-described gender.
    pub gender: Gender,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Replacement values for a user's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChanges {
    /// Normalized email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Self-described gender.
    pub gender: Gender,
    /// New role; `None` keeps the current one.
    pub role: Option<Role>,
    /// New password digest; `None` keeps the current one.
    pub credential: Option<Credential>,
}

/// Account details supplied at sign-up (or by an administrator).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    /// Raw email; normalized on registration.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Self-described gender.
    pub gender: Gender,
    /// Account role. Self sign-up always uses `Role::User`.
    pub role: Role,
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Raw email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Self-described gender.
    pub gender: Gender,
    /// Expected concurrency token; current version when absent.
    pub version: Option<i32>,
}

/// Administrator update of any account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUserUpdate {
    /// Id repeated in the body; must equal the path id.
    pub id: Option<UserId>,
    /// Profile fields.
    pub profile: ProfileUpdate,
    /// New role; `None` keeps the current one.
    pub role: Option<Role>,
    /// New password; hashed and stored with the other changes.
    pub password: Option<String>,
}

/// Trims and lower-cases an email, rejecting obviously malformed ones.
///
/// # Errors
///
/// Returns `AppError::Validation` if the address is empty, too long, or not
/// of the form `local@domain`.
pub fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }
    if email.chars().count() > MAX_EMAIL_CHARS {
        return Err(AppError::Validation(format!(
            "email must be at most {MAX_EMAIL_CHARS} characters"
        )));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::Validation("email is not valid".to_string()));
    }
    Ok(email)
}

/// Trims an optional name field and enforces its length limit.
///
/// # Errors
///
/// Returns `AppError::Validation` if the name is too long.
pub fn normalize_name(field: &str, raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "{field} must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(name.to_string())
}

impl ProfileUpdate {
    /// Validates the fields and converts them into store changes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a bad email or an oversized name.
    pub fn into_changes(self, role: Option<Role>) -> AppResult<UserChanges> {
        Ok(UserChanges {
            email: normalize_email(&self.email)?,
            first_name: normalize_name("firstName", &self.first_name)?,
            last_name: normalize_name("lastName", &self.last_name)?,
            gender: self.gender,
            role,
            credential: None,
        })
    }
}
