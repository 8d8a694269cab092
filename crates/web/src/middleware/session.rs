//! Session middleware configuration.
//!
//! Sessions live in `logistik.session`; the cookie only carries a signed
//! session id.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AppConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "logistik_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Build the `PostgreSQL` session store.
///
/// # Panics
///
/// Panics if the schema name or table name is invalid (should never happen
/// with hardcoded "logistik" and "session" values).
#[must_use]
pub fn create_session_store(pool: &PgPool) -> PostgresStore {
    PostgresStore::new(pool.clone())
        .with_schema_name("logistik")
        .expect("valid schema name")
        .with_table_name("session")
        .expect("valid table name")
}

/// Create the session layer with the `PostgreSQL` store.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AppConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    session_layer(create_session_store(pool), config)
}

/// Create a session layer over any store.
///
/// Cookies are signed with a key derived from `SECRET_KEY`, `HttpOnly`,
/// `SameSite=Lax`, and `Secure` when the base URL is HTTPS.
#[must_use]
pub fn session_layer<Store: SessionStore>(
    store: Store,
    config: &AppConfig,
) -> SessionManagerLayer<Store, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.session_secret))
}

/// Derive a 64-byte cookie signing key from the configured secret.
fn signing_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_stable() {
        let a = signing_key(&SecretString::from("k7#Qz!9vR2@mW4$xT8^pL1&nB6*cY3%d"));
        let b = signing_key(&SecretString::from("k7#Qz!9vR2@mW4$xT8^pL1&nB6*cY3%d"));
        let c = signing_key(&SecretString::from("a different but equally random key!"));

        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }
}
