// browser/api/db.rs - Database connection pool setup
//
// This module provides PostgreSQL pool initialization from BrowserConfig.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::BrowserConfig;
use crate::error::StoreError;

/// Create a PostgreSQL connection pool
///
/// Reads the connection string and pool size from the configuration and
/// applies the timeouts we use everywhere else.
pub async fn create_pool(config: &BrowserConfig) -> Result<PgPool, StoreError> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not set".to_string()))?;

    tracing::info!(
        "Connecting to PostgreSQL (max {} connections)",
        config.max_connections
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    Ok(pool)
}
