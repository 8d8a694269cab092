//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! logistik-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `LOGISTIK_DATABASE_URL` or `DATABASE_URL` - `PostgreSQL` connection string
//!
//! Applies the migrations embedded in `logistik-web` and creates the session
//! table. The web server does the same on startup, so this is only needed
//! when the schema should exist before the first deployment.

use thiserror::Error;

use logistik_web::config::{ConfigError, database_url_from_env};
use logistik_web::db::{self, MIGRATOR};
use logistik_web::middleware::create_session_store;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;
    create_session_store(&pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
