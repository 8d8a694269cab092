//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string (`LOGISTIK_DATABASE_URL` wins if both are set)
//! - `SECRET_KEY` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `LOGISTIK_HOST` - Bind address (default: 127.0.0.1)
//! - `LOGISTIK_PORT` - Listen port (default: 5000)
//! - `LOGISTIK_BASE_URL` - Public URL (default: `http://localhost:5000`); `https://` enables Secure cookies
//! - `LOGISTIK_SEED_DEMO_USERS` - Seed the demo admin and user accounts (default: true)
//! - `LOGISTIK_DEMO_ADMIN_USERNAME` / `_EMAIL` / `_PASSWORD` - Demo admin account
//! - `LOGISTIK_DEMO_USER_USERNAME` / `_EMAIL` / `_PASSWORD` - Demo user account
//! - `LOGISTIK_LOG_JSON` - Emit JSON logs instead of text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use logistik_core::{Email, Role};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Demo accounts created at bootstrap
    pub demo_users: DemoUsersConfig,
    /// Emit JSON logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Demo accounts seeded on first start.
#[derive(Debug, Clone)]
pub struct DemoUsersConfig {
    /// When false, bootstrap skips seeding entirely
    pub enabled: bool,
    pub admin: DemoAccount,
    pub user: DemoAccount,
}

/// One seeded account.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct DemoAccount {
    pub username: String,
    pub email: Email,
    pub password: SecretString,
    pub role: Role,
}

impl std::fmt::Debug for DemoAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the session secret fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("LOGISTIK_DATABASE_URL")?;
        let host = get_env_or_default("LOGISTIK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("LOGISTIK_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("LOGISTIK_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("LOGISTIK_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("LOGISTIK_BASE_URL", &format!("http://localhost:{port}"));
        let session_secret = get_validated_secret("SECRET_KEY")?;
        validate_session_secret(&session_secret, "SECRET_KEY")?;

        let demo_users = DemoUsersConfig::from_env()?;
        let log_json = get_bool_env("LOGISTIK_LOG_JSON", false)?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            demo_users,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl DemoUsersConfig {
    /// Load demo account settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a flag or email override is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: get_bool_env("LOGISTIK_SEED_DEMO_USERS", true)?,
            admin: DemoAccount::from_env(
                "LOGISTIK_DEMO_ADMIN",
                ("admin", "admin@logistik.com", "admin123"),
                Role::Admin,
            )?,
            user: DemoAccount::from_env(
                "LOGISTIK_DEMO_USER",
                ("user", "user@logistik.com", "user123"),
                Role::User,
            )?,
        })
    }

    /// Both accounts, admin first.
    #[must_use]
    pub fn accounts(&self) -> [&DemoAccount; 2] {
        [&self.admin, &self.user]
    }
}

impl DemoAccount {
    fn from_env(
        prefix: &str,
        (username, email, password): (&str, &str, &str),
        role: Role,
    ) -> Result<Self, ConfigError> {
        let email_key = format!("{prefix}_EMAIL");
        let email = Email::parse(&get_env_or_default(&email_key, email))
            .map_err(|e| ConfigError::InvalidEnvVar(email_key, e.to_string()))?;

        Ok(Self {
            username: get_env_or_default(&format!("{prefix}_USERNAME"), username),
            email,
            password: SecretString::from(get_env_or_default(
                &format!("{prefix}_PASSWORD"),
                password,
            )),
            role,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Read only the database URL, for tools that do not serve HTTP.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither URL variable is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url("LOGISTIK_DATABASE_URL")
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a boolean flag. Accepts `true/false`, `1/0`, `yes/no` (case-insensitive).
fn get_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |value| {
        parse_bool(&value).ok_or_else(|| {
            ConfigError::InvalidEnvVar(key.to_string(), format!("expected a boolean, got '{value}'"))
        })
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
