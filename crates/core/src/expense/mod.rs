//! Individual spending records.

#[cfg(test)]
mod tests;

use chrono::{DateTime, NaiveDate, Utc};
use pennywise_shared::types::{Amount, BudgetId, ExpenseId, UserId};
use pennywise_shared::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::budget::MAX_CATEGORY_CHARS;
use crate::resource::{Resource, required_text};

/// Longest accepted description.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Money spent on one occasion, optionally charged against a budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Expense ID.
    #[serde(rename = "expenseID")]
    pub id: ExpenseId,
    /// Owning user.
    #[serde(rename = "userID")]
    pub user_id: UserId,
    /// Budget this expense counts against; same owner.
    #[serde(rename = "budgetID")]
    pub budget_id: Option<BudgetId>,
    /// Spending category.
    pub category: String,
    /// Amount spent.
    pub amount: Amount,
    /// Day the expense was incurred.
    pub date: NaiveDate,
    /// Free-form note, possibly empty.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Concurrency token.
    pub version: i32,
}

/// Writable expense fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseDraft {
    /// Budget reference.
    pub budget_id: Option<BudgetId>,
    /// Spending category.
    pub category: String,
    /// Amount spent.
    pub amount: Amount,
    /// Day the expense was incurred.
    pub date: NaiveDate,
    /// Free-form note.
    pub description: String,
}

impl Resource for Expense {
    type Id = ExpenseId;
    type Draft = ExpenseDraft;

    const KIND: &'static str = "Expense";

    fn id(&self) -> ExpenseId {
        self.id
    }

    fn owner(&self) -> UserId {
        self.user_id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn validate(draft: ExpenseDraft) -> AppResult<ExpenseDraft> {
        let description = draft.description.trim().to_string();
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(AppError::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
        Ok(ExpenseDraft {
            budget_id: draft.budget_id,
            category: required_text("category", &draft.category, MAX_CATEGORY_CHARS)?,
            amount: draft.amount,
            date: draft.date,
            description,
        })
    }
}
