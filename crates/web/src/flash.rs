//! One-shot notices carried across a redirect in the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session::keys;

/// Visual category of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Info,
    Danger,
}

impl FlashLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Danger => "danger",
        }
    }
}

/// A notice shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Danger,
            message: message.into(),
        }
    }

    /// CSS modifier used by the templates.
    #[must_use]
    pub const fn level(&self) -> &'static str {
        self.level.as_str()
    }
}

/// Queue a notice for the next page.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push(session: &Session, flash: Flash) -> Result<(), tower_sessions::session::Error> {
    let mut pending: Vec<Flash> = session.get(keys::FLASH).await?.unwrap_or_default();
    pending.push(flash);
    session.insert(keys::FLASH, pending).await
}

/// Remove and return every queued notice, oldest first.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn take(session: &Session) -> Result<Vec<Flash>, tower_sessions::session::Error> {
    Ok(session
        .remove::<Vec<Flash>>(keys::FLASH)
        .await?
        .unwrap_or_default())
}
