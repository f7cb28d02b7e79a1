//! Postgres connection pool.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::{DbConfig, DbError};

/// Type alias for the shared Postgres pool used across the whole application.
pub type DbPool = PgPool;

/// Create a new connection pool from `config`.
///
/// Connects eagerly, so an unreachable database fails here rather than on
/// the first request.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, DbError> {
    let options = config.connect_options()?;
    info!(
        host = %config.host,
        database = %config.database,
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_with(options)
        .await
        .map_err(DbError::Connect)?;

    info!("Connected to database");
    Ok(pool)
}

/// Run embedded SQLx migrations located in `./migrations` (relative to the
/// workspace root at build time).
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbError> {
    info!("Running database migrations");
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}
