//! Lazy bootstrap middleware.
//!
//! If the database was unreachable at startup, the first request after it
//! comes back performs the migration and seeding instead.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Paths that must answer without touching the database.
const SKIP_PREFIXES: &[&str] = &["/health", "/static/"];

/// Ensure bootstrap has run before handling the request.
///
/// A failure is logged and the request continues; handlers that need the
/// database report their own errors.
pub async fn bootstrap_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let skip = SKIP_PREFIXES.iter().any(|prefix| path.starts_with(prefix));

    if !skip
        && !state.is_bootstrapped()
        && let Err(e) = state.ensure_bootstrapped().await
    {
        tracing::warn!(error = %e, "Database bootstrap failed, will retry on next request");
    }

    next.run(request).await
}
