//! Monthly category budgets.


use chrono::{DateTime, Datelike, NaiveDate, Utc};
use pennywise_shared::types::{Amount, BudgetId, UserId};
use pennywise_shared::AppResult;
use serde::{Deserialize, Serialize};

use crate::resource::{Resource, required_text};

/// Longest accepted category name.
pub const MAX_CATEGORY_CHARS: usize = 100;

/// A spending limit for one category in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// Budget ID.
    #[serde(rename = "budgetID")]
    pub id: BudgetId,
    /// Owning user.
    #[serde(rename = "userID")]
    pub user_id: UserId,
    /// Spending category.
    pub category: String,
    /// Budgeted amount.
    pub amount: Amount,
    /// First day of the budgeted month.
    pub month_year: NaiveDate,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Concurrency token.
    pub version: i32,
}

/// Writable budget fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetDraft {
    /// Spending category.
    pub category: String,
    /// Budgeted amount.
    pub amount: Amount,
    /// Any day in the budgeted month.
    pub month_year: NaiveDate,
}

/// Returns the first day of `date`'s month.
#[must_use]
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

impl Resource for Budget {
    type Id = BudgetId;
    type Draft = BudgetDraft;

    const KIND: &'static str = "Budget";

    fn id(&self) -> BudgetId {
        self.id
    }

    fn owner(&self) -> UserId {
        self.user_id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn validate(draft: BudgetDraft) -> AppResult<BudgetDraft> {
        Ok(BudgetDraft {
            category: required_text("category", &draft.category, MAX_CATEGORY_CHARS)?,
            amount: draft.amount,
            month_year: first_of_month(draft.month_year),
        })
    }
}
