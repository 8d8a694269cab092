//! One-time schema setup and demo account seeding.
//!
//! Runs at most once per process. A failed attempt leaves the guard empty so
//! the next request tries again; once it succeeds it never runs again.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::OnceCell;
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::{DemoAccount, DemoUsersConfig};
use crate::db::MIGRATOR;
use crate::middleware::create_session_store;
use crate::services::{AuthError, AuthService, NewUser};

/// Errors that can occur while bootstrapping the database.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("session table setup failed: {0}")]
    SessionStore(#[source] sqlx::Error),

    #[error("seeding demo users failed: {0}")]
    Seed(#[from] AuthError),
}

/// Single-acquisition guard around [`run`].
#[derive(Debug, Default)]
pub struct Bootstrap {
    done: OnceCell<()>,
}

impl Bootstrap {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            done: OnceCell::const_new(),
        }
    }

    /// Run bootstrap if it has not yet succeeded.
    ///
    /// Concurrent callers wait for the one in-flight attempt.
    ///
    /// # Errors
    ///
    /// Returns the error of the attempt this call waited on.
    pub async fn ensure(&self, pool: &PgPool, demo: &DemoUsersConfig) -> Result<(), BootstrapError> {
        self.done.get_or_try_init(|| run(pool, demo)).await?;
        Ok(())
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done.initialized()
    }
}

/// Apply migrations, create the session table and seed demo accounts.
///
/// Every step is idempotent.
///
/// # Errors
///
/// Returns `BootstrapError` for the first step that fails.
pub async fn run(pool: &PgPool, demo: &DemoUsersConfig) -> Result<(), BootstrapError> {
    MIGRATOR.run(pool).await?;
    migrate_session_store(&create_session_store(pool)).await?;

    if demo.enabled {
        let created = seed_demo_users(pool, demo).await?;
        tracing::info!(created, "Demo users checked");
    }

    tracing::info!("Bootstrap complete");
    Ok(())
}

async fn migrate_session_store(store: &PostgresStore) -> Result<(), BootstrapError> {
    store.migrate().await.map_err(BootstrapError::SessionStore)
}

/// Create the demo admin and user accounts when their usernames are free.
///
/// Returns how many accounts were created.
///
/// # Errors
///
/// Returns `BootstrapError::Seed` if an account cannot be created for a reason
/// other than the username already existing.
pub async fn seed_demo_users(pool: &PgPool, demo: &DemoUsersConfig) -> Result<usize, BootstrapError> {
    let auth = AuthService::new(pool);
    let mut created = 0;

    for account in demo.accounts() {
        if ensure_account(&auth, account).await? {
            created += 1;
        }
    }

    Ok(created)
}

async fn ensure_account(auth: &AuthService<'_>, account: &DemoAccount) -> Result<bool, AuthError> {
    let new_user = NewUser {
        username: &account.username,
        email: account.email.as_str(),
        password: account.password.expose_secret(),
        role: account.role,
    };

    let created = auth.ensure_user(&new_user).await?;
    if let Some(user) = &created {
        tracing::info!(username = %user.username, role = %user.role, "Seeded demo user");
    }
    Ok(created.is_some())
}
