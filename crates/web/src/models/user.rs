//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use logistik_core::{Email, Role, UserId};

/// A user account (domain type).
///
/// The password hash is deliberately absent; it is only ever loaded by
/// [`crate::db::UserRepository::get_credentials`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name, 3-80 characters.
    pub username: String,
    /// User's email address.
    pub email: Email,
    /// Admin or regular user.
    pub role: Role,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}
