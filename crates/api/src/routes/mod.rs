//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};
use pennywise_core::budget::Budget;
use pennywise_core::expense::Expense;
use pennywise_core::notification::Notification;

pub mod admin;
pub mod auth;
pub mod budgets;
pub mod expenses;
pub mod export;
pub mod health;
pub mod notifications;
pub mod profile;
pub mod resources;

/// Creates the API router; everything except health and auth needs a token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(resources::routes::<Budget>())
        .merge(resources::routes::<Expense>())
        .merge(resources::routes::<Notification>())
        .merge(profile::routes())
        .merge(export::routes())
        .merge(admin::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
