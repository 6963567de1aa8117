//! Database helpers for the coupon API.
//!
//! Builds the PostgreSQL pool and applies the embedded migrations in
//! `migrations/` (coupons and local_users tables, plus the seed coupons).

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::AppConfig;
use crate::error::RepositoryError;

/// Type alias for the application database pool.
pub type AppDb = PgPool;

pub async fn connect(config: &AppConfig) -> Result<AppDb, RepositoryError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    info!("Connected to application database");
    Ok(pool)
}

pub async fn migrate(pool: &AppDb) -> Result<(), RepositoryError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Application migrations complete");
    Ok(())
}
