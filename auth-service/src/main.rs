use std::sync::Arc;

use anyhow::Context;
use auth_service::config::load_auth_config;
use auth_service::seed::seed_roles;
use auth_service::store::PgStore;
use auth_service::{build_router, AppState};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_auth_config()?;
    let database_url = config
        .database_url
        .clone()
        .context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .context("Failed to connect to Postgres")?;
    let store = Arc::new(PgStore::new(pool));
    store.migrate().await?;
    seed_roles(store.as_ref())
        .await
        .context("Failed to seed roles")?;

    let addr = config.bind_addr()?;
    let state = AppState::new(store, config)?;
    let public_paths: Vec<&str> = state
        .rules
        .public_patterns()
        .map(|pattern| pattern.as_str())
        .collect();
    info!(?public_paths, "permitting anonymous access");
    let app = build_router(state);

    info!(%addr, "starting auth-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
