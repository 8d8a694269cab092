//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use logistik_core::{Operation, Role, UserId};

use super::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Login name, shown in the navigation bar.
    pub username: String,
    /// Role at login time.
    pub role: Role,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether this user may perform `op`.
    #[must_use]
    pub const fn can(&self, op: Operation) -> bool {
        self.role.can(op)
    }

    /// Path of the dashboard matching this user's role.
    #[must_use]
    pub const fn dashboard_path(&self) -> &'static str {
        if self.is_admin() {
            "/admin/dashboard"
        } else {
            "/user/dashboard"
        }
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for pending flash messages.
    pub const FLASH: &str = "flash";

    /// Key for the form token checked on every state-changing request.
    pub const CSRF_TOKEN: &str = "csrf_token";
}
