//! Pennywise API Server
//!
//! Main entry point for the Pennywise backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pennywise_api::{AppState, create_router};
use pennywise_core::SystemClock;
use pennywise_db::{
    BudgetRepository, ExpenseRepository, NotificationRepository, UserRepository, connect,
};
use pennywise_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    // Refuses to start on a missing or weak JWT secret.
    let config = AppConfig::load_validated().context("Failed to load configuration")?;

    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let jwt_service = JwtService::new(config.jwt.clone()).context("Invalid JWT configuration")?;

    let state = AppState {
        users: Arc::new(UserRepository::new(db.clone())),
        budgets: Arc::new(BudgetRepository::new(db.clone())),
        expenses: Arc::new(ExpenseRepository::new(db.clone())),
        notifications: Arc::new(NotificationRepository::new(db)),
        jwt_service: Arc::new(jwt_service),
        clock: Arc::new(SystemClock),
    };

    let app = create_router(state, &config.server, &config.cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        origins = ?config.cors.allowed_origins,
        "Server listening on {}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` filters (default `pennywise=debug,tower_http=debug`);
/// `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pennywise=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
