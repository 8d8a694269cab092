//! Authentication service.
//!
//! Password login and account creation. Accounts are only ever created by an
//! admin, the CLI, or the startup seed; there is no self sign-up.

mod error;

pub use error::{AuthError, ConflictField};

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use logistik_core::{Email, Role};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;
/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 80;

/// Hash checked when the username does not exist, so a miss costs the same
/// as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("logistik-timing-equaliser").ok());

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Check a username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user is unknown or the
    /// password is wrong.
    pub async fn verify(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let Some((user, password_hash)) = self.users.get_credentials(username).await? else {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(password, dummy);
            }
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Create an account with any role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` or `AuthError::InvalidEmail` for bad input.
    /// Returns `AuthError::Conflict` if the username or email is taken.
    pub async fn register(&self, new_user: &NewUser<'_>) -> Result<User, AuthError> {
        let username = new_user.username.trim();
        validate_username(username)?;
        let email = Email::parse(new_user.email)?;
        validate_password(new_user.password)?;

        if self.users.username_exists(username).await? {
            return Err(AuthError::Conflict {
                field: ConflictField::Username,
            });
        }
        if self.users.email_exists(&email).await? {
            return Err(AuthError::Conflict {
                field: ConflictField::Email,
            });
        }

        let password_hash = hash_password(new_user.password)?;

        let user = self
            .users
            .create(username, &email, &password_hash, new_user.role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(field) => match ConflictField::from_repository_field(&field) {
                    Some(field) => AuthError::Conflict { field },
                    None => AuthError::Repository(RepositoryError::Conflict(field)),
                },
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, role = %user.role, "User registered");
        Ok(user)
    }

    /// Create an account unless the username is already taken.
    ///
    /// Returns `None` when the user already existed.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`], except that an existing username is not
    /// an error.
    pub async fn ensure_user(&self, new_user: &NewUser<'_>) -> Result<Option<User>, AuthError> {
        match self.register(new_user).await {
            Ok(user) => Ok(Some(user)),
            Err(AuthError::Conflict {
                field: ConflictField::Username,
            }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Validate username length.
///
/// # Errors
///
/// Returns `AuthError::Validation` outside 3-80 characters.
pub fn validate_username(username: &str) -> Result<(), AuthError> {
    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(AuthError::Validation(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters."
        )));
    }
    Ok(())
}

/// Validate password length.
///
/// # Errors
///
/// Returns `AuthError::Validation` below the minimum length.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("user123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("user123", &hash).is_ok());
        assert!(matches!(
            verify_password("user124", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("admin123").unwrap(), hash_password("admin123").unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_dummy_hash_is_available() {
        assert!(DUMMY_HASH.is_some());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"x".repeat(80)).is_ok());
        assert!(validate_username(&"x".repeat(81)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_conflict_messages() {
        assert_eq!(ConflictField::Username.message(), "Username already exists.");
        assert_eq!(ConflictField::Email.message(), "Email already exists.");
        assert_eq!(
            ConflictField::from_repository_field("email"),
            Some(ConflictField::Email)
        );
        assert_eq!(ConflictField::from_repository_field("tracking_number"), None);
    }
}
