//! Owner-scoped resources.
//!
//! Budgets, expenses and notifications share one request pipeline: every
//! read and write is narrowed to the caller's own rows unless the caller is an
//! administrator. The pipeline is written once, over the [`Resource`] trait.

mod service;


pub use service::{ScopedService, Update};

use std::fmt::{Debug, Display};

use pennywise_shared::auth::Role;
use pennywise_shared::types::UserId;
use pennywise_shared::{AppError, AppResult};

/// An entity owned by exactly one user.
pub trait Resource: Clone + Debug + Send + Sync + 'static {
    /// Typed primary key.
    type Id: Copy + Eq + Debug + Display + From<i32> + Into<i32> + Send + Sync + 'static;

    /// Client-writable fields, used for both create and update.
    type Draft: Clone + Debug + Send + Sync + 'static;

    /// Human-readable name used in messages and logs.
    const KIND: &'static str;

    /// Primary key.
    fn id(&self) -> Self::Id;

    /// Owning user.
    fn owner(&self) -> UserId;

    /// Concurrency token.
    fn version(&self) -> i32;

    /// Checks required fields and returns the normalized draft.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming the offending field.
    fn validate(draft: Self::Draft) -> AppResult<Self::Draft>;
}

/// Which rows an operation may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only rows owned by this user.
    Owner(UserId),
    /// Every row (administrators).
    All,
}

impl Scope {
    /// Returns true if a row owned by `owner` is visible in this scope.
    #[must_use]
    pub fn permits(self, owner: UserId) -> bool {
        match self {
            Self::Owner(id) => id == owner,
            Self::All => true,
        }
    }
}

/// The authenticated identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// Token subject.
    pub user_id: UserId,
    /// Token role.
    pub role: Role,
}

impl Caller {
    /// Creates a caller.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Scope for single-row reads and writes: administrators see everything.
    #[must_use]
    pub const fn scope(self) -> Scope {
        if self.role.is_admin() {
            Scope::All
        } else {
            Scope::Owner(self.user_id)
        }
    }

    /// Scope limited to the caller's own rows, whatever the role.
    #[must_use]
    pub const fn own(self) -> Scope {
        Scope::Owner(self.user_id)
    }

    /// Returns true if the caller may act on data belonging to `user_id`.
    #[must_use]
    pub fn may_access(self, user_id: UserId) -> bool {
        self.scope().permits(user_id)
    }
}

/// Trims a required text field and enforces a length limit.
///
/// # Errors
///
/// Returns `AppError::Validation` if the trimmed value is empty or too long.
pub fn required_text(field: &str, value: &str, max_chars: usize) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(trimmed.to_string())
}
