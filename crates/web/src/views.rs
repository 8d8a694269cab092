//! Data prepared for templates.
//!
//! Templates only see plain strings and booleans; formatting happens here.

use chrono::{DateTime, NaiveDate, Utc};
use tower_sessions::Session;

use logistik_core::{Delivery, DeliveryStatus, Operation, Role};

use crate::csrf;
use crate::flash::{self, Flash};
use crate::models::CurrentUser;

/// Placeholder for empty optional values.
const EMPTY: &str = "-";

/// Per-page chrome: who is signed in, which notices to show, and the token
/// every form on the page submits.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub flashes: Vec<Flash>,
    pub csrf_token: String,
}

impl PageContext {
    /// Build the context, consuming any queued notices.
    pub async fn load(session: &Session, user: Option<CurrentUser>) -> Self {
        let flashes = match flash::take(session).await {
            Ok(flashes) => flashes,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read flash messages");
                Vec::new()
            }
        };
        let csrf_token = match csrf::token(session).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load form token");
                String::new()
            }
        };
        Self {
            user,
            flashes,
            csrf_token,
        }
    }

    /// Context for pages rendered without a session (e.g. error pages).
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn username(&self) -> &str {
        self.user.as_ref().map_or("", |u| u.username.as_str())
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(CurrentUser::is_admin)
    }

    #[must_use]
    pub fn can(&self, op: Operation) -> bool {
        self.user.as_ref().is_some_and(|u| u.can(op))
    }

    #[must_use]
    pub fn can_register_users(&self) -> bool {
        self.can(Operation::RegisterUser)
    }

    #[must_use]
    pub fn dashboard_path(&self) -> &'static str {
        self.user
            .as_ref()
            .map_or("/auth/login", CurrentUser::dashboard_path)
    }
}

/// One entry of a `<select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl SelectOption {
    /// Status choices with `current` preselected.
    #[must_use]
    pub fn statuses(current: &str) -> Vec<Self> {
        DeliveryStatus::ALL
            .into_iter()
            .map(|s| Self {
                value: s.as_str(),
                label: s.label(),
                selected: s.as_str() == current,
            })
            .collect()
    }

    /// Role choices with `current` preselected.
    #[must_use]
    pub fn roles(current: &str) -> Vec<Self> {
        Role::ALL
            .into_iter()
            .map(|r| Self {
                value: r.as_str(),
                label: r.label(),
                selected: r.as_str() == current,
            })
            .collect()
    }
}

/// A delivery formatted for display.
#[derive(Debug, Clone)]
pub struct DeliveryView {
    pub id: i32,
    pub tracking_number: String,
    pub recipient_name: String,
    pub recipient_address: String,
    pub recipient_phone: String,
    pub description: String,
    pub weight: String,
    pub estimated_delivery_date: String,
    pub actual_delivery_date: String,
    pub status: &'static str,
    pub status_label: &'static str,
    /// Estimated date passed and not yet delivered.
    pub overdue: bool,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl DeliveryView {
    /// Format `delivery` as of `today`.
    ///
    /// Creator and updater names are filled in separately with
    /// [`Self::with_people`] on detail pages.
    #[must_use]
    pub fn new(delivery: &Delivery, today: NaiveDate) -> Self {
        Self {
            id: delivery.id.as_i32(),
            tracking_number: delivery.tracking_number.clone(),
            recipient_name: delivery.recipient_name.clone(),
            recipient_address: delivery.recipient_address.clone(),
            recipient_phone: delivery.recipient_phone.clone(),
            description: delivery.description.clone().unwrap_or_default(),
            weight: delivery
                .weight
                .map_or_else(|| EMPTY.to_owned(), |w| format!("{w} kg")),
            estimated_delivery_date: format_date(delivery.estimated_delivery_date),
            actual_delivery_date: format_date(delivery.actual_delivery_date),
            status: delivery.status.as_str(),
            status_label: delivery.status.label(),
            overdue: delivery.is_overdue(today),
            created_by: EMPTY.to_owned(),
            updated_by: EMPTY.to_owned(),
            created_at: format_timestamp(delivery.created_at),
            updated_at: format_timestamp(delivery.updated_at),
        }
    }

    /// Attach creator and last-updater usernames.
    #[must_use]
    pub fn with_people(mut self, created_by: Option<String>, updated_by: Option<String>) -> Self {
        self.created_by = created_by.unwrap_or_else(|| EMPTY.to_owned());
        self.updated_by = updated_by.unwrap_or_else(|| EMPTY.to_owned());
        self
    }

    #[must_use]
    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| EMPTY.to_owned(), |d| d.format("%Y-%m-%d").to_string())
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}
