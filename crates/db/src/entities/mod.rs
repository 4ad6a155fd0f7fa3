//! `SeaORM` entity definitions.

pub mod prelude;

pub mod budgets;
pub mod expenses;
pub mod notifications;
pub mod sea_orm_active_enums;
pub mod users;
