//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! LOGISTIK_NEW_USER_PASSWORD=s3cret! logistik-cli user create -u dispatcher -e dispatch@example.com -r admin
//! ```
//!
//! # Environment Variables
//!
//! - `LOGISTIK_DATABASE_URL` or `DATABASE_URL` - `PostgreSQL` connection string
//! - `LOGISTIK_NEW_USER_PASSWORD` - password for the new account, kept out of
//!   shell history and process listings

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use logistik_core::{ParseRoleError, Role};
use logistik_web::config::{ConfigError, database_url_from_env};
use logistik_web::db;
use logistik_web::services::{AuthError, AuthService, NewUser};

/// Variable holding the new account's password.
pub const PASSWORD_ENV: &str = "LOGISTIK_NEW_USER_PASSWORD";

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid role.
    #[error("{0}. Valid roles: admin, user")]
    InvalidRole(#[from] ParseRoleError),

    /// Validation or conflict reported by the auth service.
    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Create a new account.
///
/// # Errors
///
/// Returns `UserError` if the role or input is invalid, the username or
/// email is taken, or the database is unreachable.
pub async fn create(username: &str, email: &str, role: &str) -> Result<(), UserError> {
    let role: Role = role.parse()?;
    let password = read_password()?;

    let database_url = database_url_from_env()?;
    let pool = db::create_pool(&database_url).await?;

    let user = AuthService::new(&pool)
        .register(&NewUser {
            username,
            email,
            password: password.expose_secret(),
            role,
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, role = %user.role, "Account created");
    Ok(())
}

fn read_password() -> Result<SecretString, UserError> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .map(SecretString::from)
        .ok_or(UserError::MissingEnvVar(PASSWORD_ENV))
}
