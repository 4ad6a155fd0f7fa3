//! Report assembly and access control.

use std::sync::Arc;

use pennywise_shared::types::UserId;
use pennywise_shared::{AppError, AppResult};
use tracing::{error, info, warn};

use super::render_csv;
use crate::budget::Budget;
use crate::expense::Expense;
use crate::resource::{Caller, Scope};
use crate::store::{ResourceStore, UserStore};

/// A rendered report ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvReport {
    /// Suggested download name.
    pub filename: String,
    /// UTF-8 CSV bytes.
    pub body: Vec<u8>,
}

/// Builds CSV reports from the stores.
#[derive(Clone)]
pub struct ExportService {
    users: Arc<dyn UserStore>,
    budgets: Arc<dyn ResourceStore<Budget>>,
    expenses: Arc<dyn ResourceStore<Expense>>,
}

impl ExportService {
    /// Creates a new export service.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        budgets: Arc<dyn ResourceStore<Budget>>,
        expenses: Arc<dyn ResourceStore<Expense>>,
    ) -> Self {
        Self {
            users,
            budgets,
            expenses,
        }
    }

    /// Exports `target`'s data for `caller`.
    ///
    /// # Errors
    ///
    /// - `AppError::Forbidden` unless `caller` is `target` or an administrator
    /// - `AppError::NotFound` if `target` does not exist
    pub async fn export(&self, caller: Caller, target: UserId) -> AppResult<CsvReport> {
        if !caller.may_access(target) {
            warn!(caller = %caller.user_id, target = %target, "Export of another user's data refused");
            return Err(AppError::Forbidden(
                "You may only export your own data".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_id(target)
            .await
            .map_err(|e| e.into_app_error("User"))?
            .ok_or_else(|| AppError::NotFound(format!("User {target} not found")))?;

        let scope = Scope::Owner(target);
        let budgets = self
            .budgets
            .list(scope)
            .await
            .map_err(|e| e.into_app_error("Budget"))?;
        let expenses = self
            .expenses
            .list(scope)
            .await
            .map_err(|e| e.into_app_error("Expense"))?;

        let body = render_csv(&user, &budgets, &expenses).map_err(|e| {
            error!(user_id = %target, error = %e, "CSV rendering failed");
            AppError::Internal(e.to_string())
        })?;

        info!(
            user_id = %target,
            budgets = budgets.len(),
            expenses = expenses.len(),
            "CSV export generated"
        );
        Ok(CsvReport {
            filename: format!("pennywise-user-{target}.csv"),
            body,
        })
    }
}
