//! Database setup and initialization

use anyhow::{Context, Result};
use fotoart_core::Config;
use sqlx::PgPool;
use std::path::Path;

/// Connect the pool and apply pending migrations
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = fotoart_db::connect_pool(
        &config.database_url,
        config.base.db_max_connections,
        config.base.db_timeout_seconds,
    )
    .await
    .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.base.db_max_connections,
        "Database connected successfully"
    );

    // Workspace migrations/ relative to this crate
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
