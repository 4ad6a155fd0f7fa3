//! Expense routes.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::resources::{Payload, ResourceRoute, required, required_amount};
use crate::AppState;
use pennywise_core::ResourceStore;
use pennywise_core::expense::{Expense, ExpenseDraft};
use pennywise_shared::AppResult;
use pennywise_shared::types::{BudgetId, ExpenseId, UserId};

/// Request body for creating or updating an expense.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePayload {
    /// Expense ID (required on update).
    #[serde(rename = "expenseID")]
    pub id: Option<ExpenseId>,
    /// Owner (admin create only).
    #[serde(rename = "userID")]
    pub user_id: Option<UserId>,
    /// Budget the expense counts against; must belong to the same user.
    #[serde(rename = "budgetID")]
    pub budget_id: Option<BudgetId>,
    /// Spending category.
    #[serde(default)]
    #[validate(length(max = 100))]
    pub category: String,
    /// Amount spent, as a string or a number.
    pub amount: Option<Decimal>,
    /// Day the expense was incurred.
    pub date: Option<NaiveDate>,
    /// Free-text note.
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: String,
    /// Expected concurrency token.
    pub version: Option<i32>,
}

impl Payload<Expense> for ExpensePayload {
    fn body_id(&self) -> Option<ExpenseId> {
        self.id
    }

    fn body_owner(&self) -> Option<UserId> {
        self.user_id
    }

    fn body_version(&self) -> Option<i32> {
        self.version
    }

    fn into_draft(self) -> AppResult<ExpenseDraft> {
        Ok(ExpenseDraft {
            budget_id: self.budget_id,
            category: self.category,
            amount: required_amount(self.amount)?,
            date: required(self.date, "date")?,
            description: self.description,
        })
    }
}

impl ResourceRoute for Expense {
    const PATH: &'static str = "expenses";

    type Payload = ExpensePayload;

    fn store(state: &AppState) -> Arc<dyn ResourceStore<Self>> {
        Arc::clone(&state.expenses)
    }
}
