//! User route handlers.
//!
//! Any signed-in account may browse deliveries and change their status.
//! Admins can use these pages too.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use super::deliveries::{self, Area, DashboardTemplate, DeliveryDetailTemplate, DeliveryPath};
use crate::csrf;
use crate::db::deliveries::DeliveryRepository;
use crate::error::Result;
use crate::filters;
use crate::flash::{self, Flash};
use crate::forms::{FieldErrors, StatusForm};
use crate::middleware::RequireAuth;
use crate::state::AppState;
use crate::views::{DeliveryView, PageContext, SelectOption};

/// Status-only update form template.
#[derive(Template, WebTemplate)]
#[template(path = "update_status.html")]
pub struct UpdateStatusTemplate {
    pub page: PageContext,
    pub delivery: DeliveryView,
    pub statuses: Vec<SelectOption>,
    pub errors: FieldErrors,
}

/// User dashboard: the same listing admins see, without admin actions.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<DashboardTemplate> {
    deliveries::dashboard(state.pool(), &session, user, Area::User).await
}

/// Delivery detail.
#[instrument(skip_all, fields(user_id = %user.id, delivery_id = %id))]
pub async fn view(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    DeliveryPath(id): DeliveryPath,
) -> Result<DeliveryDetailTemplate> {
    deliveries::detail(state.pool(), &session, user, id, Area::User).await
}

/// Display the status form with the current status selected.
#[instrument(skip_all, fields(user_id = %user.id, delivery_id = %id))]
pub async fn update_status_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    DeliveryPath(id): DeliveryPath,
) -> Result<UpdateStatusTemplate> {
    let delivery = DeliveryRepository::new(state.pool()).get(id).await?;
    let view = DeliveryView::new(&delivery, deliveries::today());

    Ok(UpdateStatusTemplate {
        page: PageContext::load(&session, Some(user)).await,
        statuses: SelectOption::statuses(view.status),
        delivery: view,
        errors: FieldErrors::default(),
    })
}

/// Handle a status-only update.
#[instrument(skip_all, fields(user_id = %user.id, delivery_id = %id))]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    DeliveryPath(id): DeliveryPath,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    csrf::verify(&session, &form.csrf_token).await?;
    let repo = DeliveryRepository::new(state.pool());

    let status = match form.validate() {
        Ok(status) => status,
        Err(errors) => {
            let delivery = repo.get(id).await?;
            return Ok(UpdateStatusTemplate {
                page: PageContext::load(&session, Some(user)).await,
                delivery: DeliveryView::new(&delivery, deliveries::today()),
                statuses: SelectOption::statuses(&form.status),
                errors,
            }
            .into_response());
        }
    };

    let delivery = repo.update_status(id, status, user.id).await?;
    tracing::info!(status = %delivery.status, "Delivery status updated");
    flash::push(&session, Flash::success("Delivery status updated successfully.")).await?;

    Ok(Redirect::to(user.dashboard_path()).into_response())
}
