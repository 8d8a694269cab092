//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::bootstrap::{Bootstrap, BootstrapError};
use crate::config::AppConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: PgPool,
    bootstrap: Bootstrap,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The pool may be lazy; nothing here touches the database.
    #[must_use]
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                bootstrap: Bootstrap::new(),
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Run migrations and seeding unless a previous call already succeeded.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError` if this attempt failed; the next call retries.
    pub async fn ensure_bootstrapped(&self) -> Result<(), BootstrapError> {
        self.inner
            .bootstrap
            .ensure(self.pool(), &self.config().demo_users)
            .await
    }

    /// Whether bootstrap has completed in this process.
    #[must_use]
    pub fn is_bootstrapped(&self) -> bool {
        self.inner.bootstrap.is_done()
    }
}
