use chrono::NaiveDate;
use pennywise_shared::types::Amount;

use super::*;

fn draft() -> ExpenseDraft {
    ExpenseDraft {
        budget_id: Some(BudgetId::new(3)),
        category: "Groceries".to_string(),
        amount: Amount::from_cents(4_250).unwrap(),
        date: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
        description: "  weekly shop ".to_string(),
    }
}

#[test]
fn test_validate_trims_fields() {
    let normalized = Expense::validate(draft()).unwrap();
    assert_eq!(normalized.description, "weekly shop");
    assert_eq!(normalized.budget_id, Some(BudgetId::new(3)));
}

#[test]
fn test_empty_description_allowed() {
    let mut input = draft();
    input.description = String::new();
    assert!(Expense::validate(input).is_ok());
}

#[test]
fn test_missing_category_rejected() {
    let mut input = draft();
    input.category = " ".to_string();
    assert!(matches!(
        Expense::validate(input),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn test_long_description_rejected() {
    let mut input = draft();
    input.description = "d".repeat(MAX_DESCRIPTION_CHARS + 1);
    assert!(Expense::validate(input).is_err());
}

#[test]
fn test_unbudgeted_expense_serializes_null_budget() {
    let expense = Expense {
        id: ExpenseId::new(1),
        user_id: UserId::new(1),
        budget_id: None,
        category: "Travel".to_string(),
        amount: Amount::from_cents(1_999).unwrap(),
        date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        description: String::new(),
        created_at: chrono::DateTime::from_timestamp(0, 0).unwrap(),
        version: 2,
    };
    let json = serde_json::to_value(&expense).unwrap();

    assert_eq!(json["expenseID"], 1);
    assert!(json["budgetID"].is_null());
    assert_eq!(json["amount"], "19.99");
    assert_eq!(json["date"], "2024-03-02");
}
