//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in user, optionally with the
//! admin role, in route handlers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use logistik_core::authorize_admin_area;

use crate::flash::{self, Flash};
use crate::models::{CurrentUser, session::keys};

/// Notice shown when a protected page is opened without signing in.
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to access this page.";

/// Notice shown when a regular user opens an admin page.
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied. Admin privileges required.";

/// Where users are sent when they lack admin rights.
const ACCESS_DENIED_REDIRECT: &str = "/user/dashboard";

/// Extractor that requires a signed-in user of any role.
///
/// If nobody is logged in, queues a notice and redirects to the login page
/// with the current path as `next`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a signed-in admin.
///
/// Anonymous callers are treated as in [`RequireAuth`]. Signed-in users
/// without the admin role are redirected to their dashboard with a notice;
/// they never see an error page.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when a protected route is not accessible.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not logged in; carries the path to come back to.
    RedirectToLogin { next: String },
    /// Logged in but lacking the admin role.
    AccessDenied,
    /// No session layer is installed.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::AccessDenied => Redirect::to(ACCESS_DENIED_REDIRECT).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Login page URL that returns to `next` afterwards.
#[must_use]
pub fn login_url(next: &str) -> String {
    format!("/auth/login?next={}", urlencoding::encode(next))
}

async fn signed_in_user(parts: &Parts) -> Result<CurrentUser, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    if let Some(user) = current_user(session).await {
        return Ok(user);
    }

    let _ = flash::push(session, Flash::info(LOGIN_REQUIRED_MESSAGE)).await;
    let next = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_owned(), ToString::to_string);

    Err(AuthRejection::RedirectToLogin { next })
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        signed_in_user(parts).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = signed_in_user(parts).await?;

        if let Err(denied) = authorize_admin_area(user.role) {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), error = %denied, "Admin route denied");
            if let Some(session) = parts.extensions.get::<Session>() {
                let _ = flash::push(session, Flash::danger(ACCESS_DENIED_MESSAGE)).await;
            }
            return Err(AuthRejection::AccessDenied);
        }

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => current_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Helper to set the current user in the session.
///
/// Cycles the session id first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Helper to destroy the session entirely (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
