//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Request extractors
//! - Error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use pennywise_core::auth::AuthService;
use pennywise_core::budget::Budget;
use pennywise_core::expense::Expense;
use pennywise_core::export::ExportService;
use pennywise_core::notification::Notification;
use pennywise_core::user::UserService;
use pennywise_core::{Clock, ResourceStore, UserStore};
use pennywise_shared::JwtService;
use pennywise_shared::config::{CorsConfig, ServerConfig};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Account storage.
    pub users: Arc<dyn UserStore>,
    /// Budget storage.
    pub budgets: Arc<dyn ResourceStore<Budget>>,
    /// Expense storage.
    pub expenses: Arc<dyn ResourceStore<Expense>>,
    /// Notification storage.
    pub notifications: Arc<dyn ResourceStore<Notification>>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Time source for created-at stamps.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Registration, login and password changes.
    #[must_use]
    pub fn auth_service(&self) -> AuthService {
        AuthService::new(Arc::clone(&self.users), Arc::clone(&self.clock))
    }

    /// Profiles and administrator user management.
    #[must_use]
    pub fn user_service(&self) -> UserService {
        UserService::new(Arc::clone(&self.users), Arc::clone(&self.clock))
    }

    /// CSV reports.
    #[must_use]
    pub fn export_service(&self) -> ExportService {
        ExportService::new(
            Arc::clone(&self.users),
            Arc::clone(&self.budgets),
            Arc::clone(&self.expenses),
        )
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState, server: &ServerConfig, cors: &CorsConfig) -> Router {
    Router::new()
        .merge(routes::api_routes_with_state(state.clone()))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new(std::iter::once(
            header::AUTHORIZATION,
        )))
        .layer(cors_layer(cors))
        .with_state(state)
}

/// Builds the CORS layer from the configured allow-list.
///
/// Credentials are allowed, so origins, methods and headers are all explicit.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::LOCATION, header::CONTENT_DISPOSITION])
        .allow_credentials(true)
}
