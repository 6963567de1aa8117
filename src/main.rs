//! # Coupon API
//!
//! A small Axum service for coupon management with bearer-token login and
//! registration.
//!
//! ## Architecture
//!
//! - Axum handles HTTP routing and the request/response lifecycle
//! - SQLx manages the PostgreSQL database (coupons and local_users)
//! - Repositories sit between handlers and storage; coupon writes are staged
//!   and committed as a unit
//! - `COUPON_API_STORAGE=memory` swaps PostgreSQL for an in-process store

use std::sync::Arc;

use tracing::info;

use coupon_api::config::{AppConfig, StorageBackend};
use coupon_api::repository::PgStore;
use coupon_api::{create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coupon_api=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting coupon API");

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();

    let state = match config.storage {
        StorageBackend::Postgres => {
            let pool = db::connect(&config).await?;
            db::migrate(&pool).await?;
            let store = Arc::new(PgStore::new(pool));
            AppState::new(config, store.clone(), store)
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on shutdown");
            AppState::in_memory(config)
        }
    };

    let app = create_app(state);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
