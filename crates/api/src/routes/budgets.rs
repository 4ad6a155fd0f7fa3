//! Budget routes.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::resources::{Payload, ResourceRoute, required, required_amount};
use crate::AppState;
use pennywise_core::ResourceStore;
use pennywise_core::budget::{Budget, BudgetDraft};
use pennywise_shared::AppResult;
use pennywise_shared::types::{BudgetId, UserId};

/// Request body for creating or updating a budget.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPayload {
    /// Budget ID (required on update).
    #[serde(rename = "budgetID")]
    pub id: Option<BudgetId>,
    /// Owner (admin create only).
    #[serde(rename = "userID")]
    pub user_id: Option<UserId>,
    /// Spending category.
    #[serde(default)]
    #[validate(length(max = 100))]
    pub category: String,
    /// Budgeted amount, as a string or a number.
    pub amount: Option<Decimal>,
    /// Any day of the budgeted month.
    pub month_year: Option<NaiveDate>,
    /// Expected concurrency token.
    pub version: Option<i32>,
}

impl Payload<Budget> for BudgetPayload {
    fn body_id(&self) -> Option<BudgetId> {
        self.id
    }

    fn body_owner(&self) -> Option<UserId> {
        self.user_id
    }

    fn body_version(&self) -> Option<i32> {
        self.version
    }

    fn into_draft(self) -> AppResult<BudgetDraft> {
        Ok(BudgetDraft {
            category: self.category,
            amount: required_amount(self.amount)?,
            month_year: required(self.month_year, "monthYear")?,
        })
    }
}

impl ResourceRoute for Budget {
    const PATH: &'static str = "budgets";

    type Payload = BudgetPayload;

    fn store(state: &AppState) -> Arc<dyn ResourceStore<Self>> {
        Arc::clone(&state.budgets)
    }
}
