//! Database seeder for Pennywise development and testing.
//!
//! Creates an administrator and a demo user with a few budgets, expenses and
//! notifications. Running it twice is harmless: existing accounts are kept and
//! their data is not duplicated.
//!
//! Environment:
//! - `DATABASE_URL` (required)
//! - `SEED_ADMIN_EMAIL` (default `admin@pennywise.local`)
//! - `SEED_ADMIN_PASSWORD` (required)
//! - `SEED_DEMO_PASSWORD` (defaults to the admin password)
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::info;

use pennywise_core::auth::AuthService;
use pennywise_core::budget::{Budget, BudgetDraft};
use pennywise_core::expense::{Expense, ExpenseDraft};
use pennywise_core::notification::{Notification, NotificationDraft};
use pennywise_core::user::{Gender, Registration, User, normalize_email};
use pennywise_core::{Clock, ScopedService, SystemClock, UserStore};
use pennywise_db::{
    BudgetRepository, ExpenseRepository, NotificationRepository, UserRepository, connect,
};
use pennywise_shared::auth::Role;
use pennywise_shared::config::DatabaseConfig;
use pennywise_shared::types::Amount;

const DEMO_EMAIL: &str = "demo@pennywise.local";

/// Category, budgeted cents, and the expenses (cents, description) against it.
const SAMPLE: &[(&str, i64, &[(i64, &str)])] = &[
    ("Groceries", 45_000, &[(8_245, "Weekly shop"), (3_110, "Farmers market")]),
    ("Rent", 120_000, &[(120_000, "Monthly rent")]),
    ("Transport", 9_000, &[(2_500, "Bus pass top-up")]),
    ("Entertainment", 15_000, &[(1_899, "Cinema, with snacks")]),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pennywise=info,seeder=info".into()),
        )
        .init();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let admin_email =
        std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@pennywise.local".to_string());
    let admin_password =
        std::env::var("SEED_ADMIN_PASSWORD").context("SEED_ADMIN_PASSWORD must be set")?;
    if admin_password.trim().is_empty() {
        bail!("SEED_ADMIN_PASSWORD must not be blank");
    }
    let demo_password =
        std::env::var("SEED_DEMO_PASSWORD").unwrap_or_else(|_| admin_password.clone());

    info!("Connecting to database...");
    let db = connect(&DatabaseConfig {
        url,
        max_connections: 2,
        min_connections: 1,
    })
    .await
    .context("Failed to connect to database")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(db.clone()));
    let auth = AuthService::new(Arc::clone(&users), Arc::clone(&clock));

    info!("Seeding administrator...");
    ensure_user(&auth, users.as_ref(), &admin_email, &admin_password, Role::Admin).await?;

    info!("Seeding demo user...");
    let (demo, fresh) =
        ensure_user(&auth, users.as_ref(), DEMO_EMAIL, &demo_password, Role::User).await?;
    if !fresh {
        info!(user_id = %demo.id, "Demo user already exists, skipping sample data");
        return Ok(());
    }

    let budgets: ScopedService<Budget> =
        ScopedService::new(Arc::new(BudgetRepository::new(db.clone())), Arc::clone(&clock));
    let expenses: ScopedService<Expense> =
        ScopedService::new(Arc::new(ExpenseRepository::new(db.clone())), Arc::clone(&clock));
    let notifications: ScopedService<Notification> =
        ScopedService::new(Arc::new(NotificationRepository::new(db)), Arc::clone(&clock));

    let today = clock.now().date_naive();

    for (category, budgeted, spent) in SAMPLE {
        let budget = budgets
            .create(
                demo.id,
                BudgetDraft {
                    category: (*category).to_string(),
                    amount: Amount::from_cents(*budgeted)?,
                    month_year: today,
                },
            )
            .await?;
        for (cents, description) in *spent {
            expenses
                .create(
                    demo.id,
                    ExpenseDraft {
                        budget_id: Some(budget.id),
                        category: (*category).to_string(),
                        amount: Amount::from_cents(*cents)?,
                        date: today,
                        description: (*description).to_string(),
                    },
                )
                .await?;
        }
    }

    notifications
        .create(
            demo.id,
            NotificationDraft {
                message: "Welcome to Pennywise".to_string(),
                is_read: false,
            },
        )
        .await?;

    info!(user_id = %demo.id, "Seeding complete");
    Ok(())
}

/// Returns the account and whether it was created just now.
async fn ensure_user(
    auth: &AuthService,
    users: &dyn UserStore,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<(User, bool)> {
    let email = normalize_email(email)?;
    if let Some(existing) = users.find_by_email(&email).await? {
        info!(email = %email, "Account already exists, skipping...");
        return Ok((existing.user, false));
    }

    let first_name = if role.is_admin() { "Admin" } else { "Demo" };
    let user = auth
        .register(
            Registration {
                first_name: first_name.to_string(),
                email,
                last_name: "User".to_string(),
                gender: Gender::Unspecified,
                role,
            },
            password,
        )
        .await?;
    info!(user_id = %user.id, role = %user.role, "Created account");
    Ok((user, true))
}
