//! Pages shared by the admin and user areas.
//!
//! Both roles see the same delivery listing and detail page; only the links
//! offered differ.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tower_sessions::Session;

use logistik_core::{Delivery, DeliveryId, StatusCounts, UserId};

use crate::db::deliveries::DeliveryRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::CurrentUser;
use crate::views::{DeliveryView, PageContext};

/// Which half of the site a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Admin,
    User,
}

impl Area {
    /// URL prefix of the area.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::User => "/user",
        }
    }
}

/// Delivery id taken from the `{id}` path segment.
///
/// Anything that is not an `i32` cannot name a delivery, so it is answered
/// with the not-found page rather than a bad-request error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPath(pub DeliveryId);

impl<S> FromRequestParts<S> for DeliveryPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;

        raw.parse::<i32>()
            .map(|id| Self(DeliveryId::new(id)))
            .map_err(|_| AppError::NotFound)
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub prefix: &'static str,
    pub admin_area: bool,
    pub counts: StatusCounts,
    pub deliveries: Vec<DeliveryView>,
}

/// Delivery detail template.
#[derive(Template, WebTemplate)]
#[template(path = "delivery_view.html")]
pub struct DeliveryDetailTemplate {
    pub page: PageContext,
    pub prefix: &'static str,
    pub admin_area: bool,
    pub delivery: DeliveryView,
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Build the dashboard: every delivery plus fresh status counts.
pub async fn dashboard(
    pool: &PgPool,
    session: &Session,
    user: CurrentUser,
    area: Area,
) -> Result<DashboardTemplate> {
    let repo = DeliveryRepository::new(pool);
    let counts = repo.count_by_status().await?;
    let today = today();
    let deliveries = repo
        .list()
        .await?
        .iter()
        .map(|d| DeliveryView::new(d, today))
        .collect();

    Ok(DashboardTemplate {
        page: PageContext::load(session, Some(user)).await,
        prefix: area.prefix(),
        admin_area: area == Area::Admin,
        counts,
        deliveries,
    })
}

/// Build the detail page, resolving creator and last updater names.
pub async fn detail(
    pool: &PgPool,
    session: &Session,
    user: CurrentUser,
    id: DeliveryId,
    area: Area,
) -> Result<DeliveryDetailTemplate> {
    let delivery = DeliveryRepository::new(pool).get(id).await?;
    let view = describe(pool, &delivery).await?;

    Ok(DeliveryDetailTemplate {
        page: PageContext::load(session, Some(user)).await,
        prefix: area.prefix(),
        admin_area: area == Area::Admin,
        delivery: view,
    })
}

/// Format a delivery with creator and updater usernames.
pub async fn describe(pool: &PgPool, delivery: &Delivery) -> Result<DeliveryView> {
    let created_by = username(pool, Some(delivery.created_by)).await?;
    let updated_by = username(pool, delivery.updated_by).await?;
    Ok(DeliveryView::new(delivery, today()).with_people(created_by, updated_by))
}

async fn username(pool: &PgPool, id: Option<UserId>) -> Result<Option<String>> {
    let Some(id) = id else {
        return Ok(None);
    };
    let user = UserRepository::new(pool).get_by_id(id).await?;
    Ok(user.map(|u| u.username))
}
