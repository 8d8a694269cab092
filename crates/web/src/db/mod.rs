//! Database operations for Logistik `PostgreSQL`.
//!
//! # Schema: `logistik`
//!
//! ## Tables
//!
//! - `user` - Accounts with argon2id password hashes and a role
//! - `delivery` - Tracked deliveries, referencing `user` for audit columns
//! - `session` - Tower-sessions storage (created by the session store itself)
//!
//! # Migrations
//!
//! Migrations live in `crates/web/migrations/` and are embedded in the binary.
//! They run once per process through the bootstrap guard, or explicitly via:
//! ```bash
//! cargo run -p logistik-cli -- migrate
//! ```

pub mod deliveries;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use deliveries::DeliveryRepository;
pub use users::UserRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation; carries the offending field name.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
}

/// Create a `PostgreSQL` connection pool and connect immediately.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect(database_url.expose_secret()).await
}

/// Create a pool that connects on first use.
///
/// The web server starts even when the database is down; requests that need
/// it fail until it comes back.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection string cannot be parsed.
pub fn create_lazy_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect_lazy(database_url.expose_secret())
}

/// Map a unique violation to [`RepositoryError::Conflict`].
///
/// `fields` pairs constraint names with the field they guard; a violation of
/// an unlisted constraint is reported with the constraint name itself.
pub(crate) fn map_unique_violation(e: sqlx::Error, fields: &[(&str, &str)]) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let constraint = db_err.constraint().unwrap_or_default();
        let field = fields
            .iter()
            .find(|(name, _)| *name == constraint)
            .map_or(constraint, |(_, field)| *field);
        return RepositoryError::Conflict(field.to_owned());
    }
    RepositoryError::Database(e)
}
