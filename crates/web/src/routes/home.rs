//! Root route handler.

use axum::response::Redirect;
use tracing::instrument;

use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;

/// Send signed-in users to their dashboard and everyone else to login.
#[instrument(skip_all)]
pub async fn index(OptionalAuth(user): OptionalAuth) -> Redirect {
    Redirect::to(
        user.as_ref()
            .map_or("/auth/login", CurrentUser::dashboard_path),
    )
}
