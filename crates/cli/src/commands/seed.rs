//! Demo account seeding.
//!
//! # Usage
//!
//! ```bash
//! logistik-cli seed
//! ```
//!
//! Creates the demo admin and user accounts (`admin`/`admin123` and
//! `user`/`user123` unless overridden through the `LOGISTIK_DEMO_*`
//! variables). Existing usernames are left untouched, so running it twice
//! is harmless. `LOGISTIK_SEED_DEMO_USERS` is ignored here; asking for a
//! seed is explicit.

use tracing::info;

use logistik_web::bootstrap::seed_demo_users;
use logistik_web::config::{DemoUsersConfig, database_url_from_env};
use logistik_web::db;

/// Seed the demo accounts.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the database is unreachable,
/// or an account cannot be created.
pub async fn demo_users() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url_from_env()?;
    let demo = DemoUsersConfig::from_env()?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let created = seed_demo_users(&pool, &demo).await?;
    info!(created, "Demo accounts seeded");

    Ok(())
}
