//! Initial database migration.
//!
//! Creates the users, budgets, expenses and notifications tables with the
//! ownership constraints the repositories rely on.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: USERS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: OWNED RESOURCES
        // ============================================================
        db.execute_unprepared(BUDGETS_SQL).await?;
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(NOTIFICATIONS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM ('user', 'admin');

CREATE TYPE gender AS ENUM ('male', 'female', 'other', 'unspecified');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id SERIAL PRIMARY KEY,
    email VARCHAR(254) NOT NULL,
    password_hash TEXT NOT NULL,
    role user_role NOT NULL DEFAULT 'user',
    first_name VARCHAR(100) NOT NULL DEFAULT '',
    last_name VARCHAR(100) NOT NULL DEFAULT '',
    gender gender NOT NULL DEFAULT 'unspecified',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    version INTEGER NOT NULL DEFAULT 1,

    CONSTRAINT users_email_lowercase CHECK (email = lower(email))
);

-- Case-insensitive uniqueness
CREATE UNIQUE INDEX users_email_lower_key ON users (lower(email));
";

// Expenses reference (budget_id, user_id) so a budget of another user can
// never be referenced. NO ACTION rather than RESTRICT: the check runs at the
// end of the statement, which lets a user delete cascade through both tables
// while a direct budget delete with expenses still fails.
const BUDGETS_SQL: &str = r"
CREATE TABLE budgets (
    id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    category VARCHAR(100) NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    month_year DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    version INTEGER NOT NULL DEFAULT 1,

    CONSTRAINT budgets_amount_non_negative CHECK (amount >= 0),
    CONSTRAINT budgets_month_year_first_day CHECK (EXTRACT(DAY FROM month_year) = 1),
    CONSTRAINT budgets_id_user_key UNIQUE (id, user_id)
);

CREATE INDEX idx_budgets_user ON budgets(user_id);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    budget_id INTEGER,
    category VARCHAR(100) NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    date DATE NOT NULL,
    description VARCHAR(500) NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    version INTEGER NOT NULL DEFAULT 1,

    CONSTRAINT expenses_amount_non_negative CHECK (amount >= 0),
    CONSTRAINT expenses_budget_same_owner_fkey
        FOREIGN KEY (budget_id, user_id) REFERENCES budgets(id, user_id)
        ON DELETE NO ACTION
);

CREATE INDEX idx_expenses_user ON expenses(user_id);
CREATE INDEX idx_expenses_budget ON expenses(budget_id) WHERE budget_id IS NOT NULL;
";

const NOTIFICATIONS_SQL: &str = r"
CREATE TABLE notifications (
    id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    message TEXT NOT NULL,
    is_read BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    version INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX idx_notifications_user ON notifications(user_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS notifications;
DROP TABLE IF EXISTS expenses;
DROP TABLE IF EXISTS budgets;
DROP TABLE IF EXISTS users;
DROP TYPE IF EXISTS gender;
DROP TYPE IF EXISTS user_role;
";
