//! # Database Persistence Layer
//!
//! Postgres persistence via SQLx.
//!
//! ## Architecture
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, the API
//! persists the active pack-size configuration and memoizes calculation
//! results. When absent, the API operates in in-memory-only mode (suitable
//! for development and testing).
//!
//! ## Tables
//!
//! - `pack_configurations`: every submitted set, unique by signature, with
//!   exactly one row flagged `active`.
//! - `order_calculations`: solved orders per configuration.

pub mod order_calculations;
pub mod pack_configurations;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Connect to PostgreSQL and run migrations.
///
/// Returns `None` when no URL is configured (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let url = match database_url {
        Some(url) => url,
        None => {
            tracing::warn!(
                "DATABASE_URL not set; running in-memory only. \
                 Pack sizes will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(Some(pool))
}
