//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::db::users::fields;

/// Which unique field a registration collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Username,
    Email,
}

impl ConflictField {
    /// Notice shown to the admin filling in the registration form.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Username => "Username already exists.",
            Self::Email => "Email already exists.",
        }
    }

    pub(crate) fn from_repository_field(field: &str) -> Option<Self> {
        match field {
            fields::USERNAME => Some(Self::Username),
            fields::EMAIL => Some(Self::Email),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConflictField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Username => fields::USERNAME,
            Self::Email => fields::EMAIL,
        })
    }
}

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown username. Never says which.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username or email already taken.
    #[error("{field} already exists")]
    Conflict { field: ConflictField },

    /// Input rejected before touching the database.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] logistik_core::EmailError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
