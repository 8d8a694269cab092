//! Role-based access policy.
//!
//! Every protected request names the [`Operation`] it performs; the web layer
//! asks [`authorize`] whether the caller's [`Role`] may perform it. Keeping the
//! table here means the route extractors and the tests agree on one source.

use serde::Serialize;

use crate::types::Role;

/// Something a signed-in caller can ask to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// See the delivery listing and status counts.
    ViewDashboard,
    /// Open a single delivery.
    ViewDelivery,
    /// Change only the status of a delivery.
    UpdateStatus,
    CreateDelivery,
    /// Change any field of a delivery.
    EditDelivery,
    DeleteDelivery,
    /// Create a new user account with any role.
    RegisterUser,
}

impl Operation {
    pub const ALL: [Self; 7] = [
        Self::ViewDashboard,
        Self::ViewDelivery,
        Self::UpdateStatus,
        Self::CreateDelivery,
        Self::EditDelivery,
        Self::DeleteDelivery,
        Self::RegisterUser,
    ];

    /// Whether only admins may perform this operation.
    #[must_use]
    pub const fn admin_only(self) -> bool {
        matches!(
            self,
            Self::CreateDelivery | Self::EditDelivery | Self::DeleteDelivery | Self::RegisterUser
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ViewDashboard => "view_dashboard",
            Self::ViewDelivery => "view_delivery",
            Self::UpdateStatus => "update_status",
            Self::CreateDelivery => "create_delivery",
            Self::EditDelivery => "edit_delivery",
            Self::DeleteDelivery => "delete_delivery",
            Self::RegisterUser => "register_user",
        };
        f.write_str(name)
    }
}

impl Role {
    /// Capability table.
    #[must_use]
    pub const fn can(self, op: Operation) -> bool {
        match self {
            Self::Admin => true,
            Self::User => !op.admin_only(),
        }
    }
}

/// The caller's role does not allow the requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("role {role} may not {operation}")]
pub struct AccessDenied {
    pub role: Role,
    pub operation: Operation,
}

/// Check `role` against `operation`.
///
/// # Errors
///
/// Returns [`AccessDenied`] when the role lacks the capability.
pub const fn authorize(role: Role, operation: Operation) -> Result<(), AccessDenied> {
    if role.can(operation) {
        Ok(())
    } else {
        Err(AccessDenied { role, operation })
    }
}

/// Check that `role` holds every admin-only capability, which is what the
/// admin pages ask for.
///
/// # Errors
///
/// Returns [`AccessDenied`] naming the first admin-only operation the role
/// lacks.
pub fn authorize_admin_area(role: Role) -> Result<(), AccessDenied> {
    Operation::ALL
        .into_iter()
        .filter(|op| op.admin_only())
        .try_for_each(|op| authorize(role, op))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_area() {
        assert!(authorize_admin_area(Role::Admin).is_ok());
        assert_eq!(
            authorize_admin_area(Role::User),
            Err(AccessDenied {
                role: Role::User,
                operation: Operation::CreateDelivery,
            })
        );
    }

    #[test]
    fn test_admin_can_do_everything() {
        for op in Operation::ALL {
            assert!(Role::Admin.can(op), "admin should be allowed to {op}");
        }
    }

    #[test]
    fn test_user_capabilities() {
        assert!(Role::User.can(Operation::ViewDashboard));
        assert!(Role::User.can(Operation::ViewDelivery));
        assert!(Role::User.can(Operation::UpdateStatus));

        assert!(!Role::User.can(Operation::CreateDelivery));
        assert!(!Role::User.can(Operation::EditDelivery));
        assert!(!Role::User.can(Operation::DeleteDelivery));
        assert!(!Role::User.can(Operation::RegisterUser));
    }

    #[test]
    fn test_authorize_reports_role_and_operation() {
        let err = authorize(Role::User, Operation::EditDelivery).unwrap_err();
        assert_eq!(err.role, Role::User);
        assert_eq!(err.operation, Operation::EditDelivery);
        assert_eq!(err.to_string(), "role user may not edit_delivery");

        assert_eq!(authorize(Role::User, Operation::UpdateStatus), Ok(()));
    }

    #[test]
    fn test_is_admin_matches_capability_table() {
        // Navigation shows admin links on `is_admin`; it must agree with
        // the admin-area gate.
        for role in Role::ALL {
            assert_eq!(role.is_admin(), authorize_admin_area(role).is_ok(), "{role}");
        }
    }
}
