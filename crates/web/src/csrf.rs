//! Per-session form tokens.
//!
//! Every rendered form carries the session's token in a hidden `csrf_token`
//! field. Handlers that change state compare the submitted value with the
//! stored one before doing anything else.

use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session::keys;

/// The session's form token, created on first use.
///
/// # Errors
///
/// Returns an error if the session store cannot be read or written.
pub async fn token(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(token) = session.get::<String>(keys::CSRF_TOKEN).await? {
        return Ok(token);
    }

    let token = Uuid::new_v4().simple().to_string();
    session.insert(keys::CSRF_TOKEN, &token).await?;
    Ok(token)
}

/// Check a submitted token against the session's.
///
/// # Errors
///
/// Returns `AppError::InvalidFormToken` when the session has no token or the
/// submitted one differs, and `AppError::Session` if the store fails.
pub async fn verify(session: &Session, submitted: &str) -> Result<(), AppError> {
    let stored = session.get::<String>(keys::CSRF_TOKEN).await?;

    match stored {
        Some(expected) if !submitted.is_empty() && expected == submitted => Ok(()),
        _ => {
            tracing::warn!("Form token mismatch");
            Err(AppError::InvalidFormToken)
        }
    }
}
