//! Per-user CSV report.
//!
//! The report has three sections separated by a blank line: the account's
//! own fields, its budgets, and its expenses.

mod service;

#[cfg(test)]
mod tests;

pub use service::{CsvReport, ExportService};

use chrono::SecondsFormat;
use csv::{Terminator, WriterBuilder};
use thiserror::Error;

use crate::budget::Budget;
use crate::expense::Expense;
use crate::user::User;

/// Title row of the account section.
pub const USER_SECTION: &str = "User Information";
/// Title row of the budget section.
pub const BUDGET_SECTION: &str = "Budgets";
/// Title row of the expense section.
pub const EXPENSE_SECTION: &str = "Expenses";

/// Failures while rendering a report.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The CSV writer rejected a record.
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The in-memory buffer could not be recovered from the writer.
    #[error("failed to finish CSV buffer: {0}")]
    Buffer(String),
}

/// Renders the report for one user.
///
/// # Errors
///
/// Returns `ExportError` if a record cannot be written.
pub fn render_csv(
    user: &User,
    budgets: &[Budget],
    expenses: &[Expense],
) -> Result<Vec<u8>, ExportError> {
    let sections = [
        user_section(user)?,
        budget_section(budgets)?,
        expense_section(expenses)?,
    ];
    Ok(sections.join(&b"\n"[..]))
}

fn section<F>(write: F) -> Result<Vec<u8>, ExportError>
where
    F: FnOnce(&mut csv::Writer<Vec<u8>>) -> Result<(), csv::Error>,
{
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    write(&mut writer)?;
    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.error().to_string()))
}

fn user_section(user: &User) -> Result<Vec<u8>, ExportError> {
    section(|w| {
        w.write_record([USER_SECTION])?;
        w.write_record(["Field", "Value"])?;
        w.write_record(["User ID", user.id.to_string().as_str()])?;
        w.write_record(["Email", user.email.as_str()])?;
        w.write_record(["First Name", user.first_name.as_str()])?;
        w.write_record(["Last Name", user.last_name.as_str()])?;
        w.write_record(["Gender", user.gender.as_str()])?;
        w.write_record(["Role", user.role.as_str()])?;
        w.write_record(["Created At", timestamp(user.created_at).as_str()])
    })
}

fn budget_section(budgets: &[Budget]) -> Result<Vec<u8>, ExportError> {
    section(|w| {
        w.write_record([BUDGET_SECTION])?;
        w.write_record(["Budget ID", "Category", "Amount", "Month", "Created At"])?;
        for budget in budgets {
            w.write_record([
                budget.id.to_string(),
                budget.category.clone(),
                budget.amount.to_string(),
                budget.month_year.format("%Y-%m").to_string(),
                timestamp(budget.created_at),
            ])?;
        }
        Ok(())
    })
}

fn expense_section(expenses: &[Expense]) -> Result<Vec<u8>, ExportError> {
    section(|w| {
        w.write_record([EXPENSE_SECTION])?;
        w.write_record([
            "Expense ID",
            "Budget ID",
            "Category",
            "Amount",
            "Date",
            "Description",
            "Created At",
        ])?;
        for expense in expenses {
            w.write_record([
                expense.id.to_string(),
                expense.budget_id.map(|id| id.to_string()).unwrap_or_default(),
                expense.category.clone(),
                expense.amount.to_string(),
                expense.date.to_string(),
                expense.description.clone(),
                timestamp(expense.created_at),
            ])?;
        }
        Ok(())
    })
}

fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
