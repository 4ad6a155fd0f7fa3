//! Repository abstractions for data access.
//!
//! Repositories implement the `pennywise-core` store ports over PostgreSQL,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod budget;
pub mod expense;
pub mod notification;
pub mod user;

pub use budget::BudgetRepository;
pub use expense::ExpenseRepository;
pub use notification::NotificationRepository;
pub use user::UserRepository;

use pennywise_core::{Scope, StoreError, StoreResult};
use pennywise_shared::types::Amount;
use rust_decimal::Decimal;
use sea_orm::{DbErr, SqlErr};
use tracing::error;

/// Owner filter for a scope; `None` means unfiltered.
pub(crate) const fn owner_filter(scope: Scope) -> Option<i32> {
    match scope {
        Scope::Owner(id) => Some(id.get()),
        Scope::All => None,
    }
}

/// Wraps an unexpected database error.
pub(crate) fn backend(err: DbErr) -> StoreError {
    error!(error = %err, "Database error");
    StoreError::Backend(err.to_string())
}

/// Classifies a constraint violation; anything else is a backend failure.
///
/// Foreign key violations mean different things on write (dangling
/// reference) and on delete (dependents exist), so the caller supplies it.
pub(crate) fn classify(err: DbErr, on_foreign_key: StoreError) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StoreError::Duplicate("email is already registered".to_string())
        }
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => on_foreign_key,
        _ => backend(err),
    }
}

/// Reads a stored `NUMERIC(14, 2)` back into an `Amount`.
pub(crate) fn amount(value: Decimal) -> StoreResult<Amount> {
    Amount::new(value).map_err(|e| {
        error!(value = %value, error = %e, "Stored amount out of range");
        StoreError::Backend(format!("stored amount {value} is invalid: {e}"))
    })
}
