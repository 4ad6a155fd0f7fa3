use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use pennywise_shared::AppError;
use pennywise_shared::auth::Role;
use pennywise_shared::types::{Amount, BudgetId, ExpenseId, UserId};

use super::*;
use crate::auth::AuthService;
use crate::budget::BudgetDraft;
use crate::clock::FixedClock;
use crate::expense::ExpenseDraft;
use crate::memory::MemoryStore;
use crate::resource::Caller;
use crate::store::ResourceStore;
use crate::user::{Gender, Registration};

fn at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
}

fn sample_user() -> User {
    User {
        id: UserId::new(7),
        email: "a@b.com".to_string(),
        role: Role::User,
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        gender: Gender::Female,
        created_at: at(),
        version: 1,
    }
}

#[test]
fn test_render_sections() {
    let budgets = vec![Budget {
        id: BudgetId::new(1),
        user_id: UserId::new(7),
        category: "Food".to_string(),
        amount: Amount::from_cents(10_000).unwrap(),
        month_year: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        created_at: at(),
        version: 1,
    }];
    let expenses = vec![Expense {
        id: ExpenseId::new(3),
        user_id: UserId::new(7),
        budget_id: Some(BudgetId::new(1)),
        category: "Food".to_string(),
        amount: Amount::from_cents(1_250).unwrap(),
        date: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
        description: "Lunch, with \"friends\"".to_string(),
        created_at: at(),
        version: 1,
    }];

    let csv = String::from_utf8(render_csv(&sample_user(), &budgets, &expenses).unwrap()).unwrap();
    let expected = "\
User Information
Field,Value
User ID,7
Email,a@b.com
First Name,Ada
Last Name,Lovelace
Gender,female
Role,user
Created At,2024-01-15T09:30:00Z

Budgets
Budget ID,Category,Amount,Month,Created At
1,Food,100.00,2024-01,2024-01-15T09:30:00Z

Expenses
Expense ID,Budget ID,Category,Amount,Date,Description,Created At
3,1,Food,12.50,2024-01-09,\"Lunch, with \"\"friends\"\"\",2024-01-15T09:30:00Z
";
    assert_eq!(csv, expected);
}

#[test]
fn test_render_empty_sections_keep_headers() {
    let csv = String::from_utf8(render_csv(&sample_user(), &[], &[]).unwrap()).unwrap();
    let blocks: Vec<&str> = csv.split("\n\n").collect();

    assert_eq!(blocks.len(), 3);
    assert!(blocks[1].starts_with("Budgets\nBudget ID,"));
    assert!(blocks[2].starts_with("Expenses\nExpense ID,"));
}

async fn service_with_data() -> (ExportService, UserId, UserId, UserId) {
    let store = Arc::new(MemoryStore::new());
    let auth = AuthService::new(store.clone(), Arc::new(FixedClock(at())));
    let mut ids = Vec::new();
    for email in ["a@b.com", "c@d.com"] {
        let user = auth
            .register(
                Registration {
                    email: email.to_string(),
                    ..Registration::default()
                },
                "Str0ng!Pass",
            )
            .await
            .unwrap();
        ids.push(user.id);
    }
    let budget = ResourceStore::<Budget>::insert(
        store.as_ref(),
        ids[0],
        BudgetDraft {
            category: "Food".to_string(),
            amount: Amount::from_cents(10_000).unwrap(),
            month_year: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        },
        at(),
    )
    .await
    .unwrap();
    ResourceStore::<Expense>::insert(
        store.as_ref(),
        ids[0],
        ExpenseDraft {
            budget_id: Some(budget.id),
            category: "Food".to_string(),
            amount: Amount::from_cents(900).unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            description: String::new(),
        },
        at(),
    )
    .await
    .unwrap();
    ResourceStore::<Budget>::insert(
        store.as_ref(),
        ids[1],
        BudgetDraft {
            category: "Secret".to_string(),
            amount: Amount::from_cents(1).unwrap(),
            month_year: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        },
        at(),
    )
    .await
    .unwrap();

    let service = ExportService::new(store.clone(), store.clone(), store);
    (service, ids[0], ids[1], UserId::new(999))
}

#[tokio::test]
async fn test_export_own_data_only() {
    let (service, alice, _, _) = service_with_data().await;
    let report = service
        .export(Caller::new(alice, Role::User), alice)
        .await
        .unwrap();

    let csv = String::from_utf8(report.body).unwrap();
    assert_eq!(report.filename, format!("pennywise-user-{alice}.csv"));
    assert!(csv.contains("Email,a@b.com"));
    assert!(csv.contains("Food,100.00"));
    assert!(csv.contains("Food,9.00"));
    assert!(!csv.contains("Secret"));
}

#[tokio::test]
async fn test_export_other_user_forbidden() {
    let (service, alice, bob, _) = service_with_data().await;
    let err = service
        .export(Caller::new(bob, Role::User), alice)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_admin_export_and_unknown_user() {
    let (service, alice, bob, ghost) = service_with_data().await;
    let admin = Caller::new(bob, Role::Admin);

    assert!(service.export(admin, alice).await.is_ok());
    assert!(matches!(
        service.export(admin, ghost).await,
        Err(AppError::NotFound(_))
    ));
}
