//! Admin route handlers.
//!
//! Full control over deliveries. Every handler takes [`RequireAdmin`], so
//! regular users are bounced to their own dashboard before any work happens.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use logistik_core::DeliveryId;

use super::deliveries::{self, Area, DashboardTemplate, DeliveryDetailTemplate, DeliveryPath};
use crate::csrf;
use crate::db::RepositoryError;
use crate::db::deliveries::DeliveryRepository;
use crate::error::Result;
use crate::filters;
use crate::flash::{self, Flash};
use crate::forms::{CsrfOnly, DeliveryForm, FieldErrors};
use crate::middleware::RequireAdmin;
use crate::models::CurrentUser;
use crate::state::AppState;
use crate::views::{PageContext, SelectOption};

/// Shown when a tracking number collides with another delivery.
pub const TRACKING_NUMBER_TAKEN_MESSAGE: &str = "Tracking number already exists.";

const DASHBOARD: &str = "/admin/dashboard";

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "delivery_form.html")]
pub struct DeliveryFormTemplate {
    pub page: PageContext,
    pub title: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub form: DeliveryForm,
    pub statuses: Vec<SelectOption>,
    pub errors: FieldErrors,
}

impl DeliveryFormTemplate {
    async fn create(
        session: &Session,
        user: CurrentUser,
        form: DeliveryForm,
        errors: FieldErrors,
    ) -> Self {
        Self {
            page: PageContext::load(session, Some(user)).await,
            title: "Create Delivery",
            action: "/admin/delivery/create".to_owned(),
            submit_label: "Create Delivery",
            statuses: SelectOption::statuses(&form.status),
            form,
            errors,
        }
    }

    async fn edit(
        session: &Session,
        user: CurrentUser,
        id: DeliveryId,
        form: DeliveryForm,
        errors: FieldErrors,
    ) -> Self {
        Self {
            page: PageContext::load(session, Some(user)).await,
            title: "Edit Delivery",
            action: format!("/admin/delivery/{id}/edit"),
            submit_label: "Update Delivery",
            statuses: SelectOption::statuses(&form.status),
            form,
            errors,
        }
    }
}

/// Admin dashboard: every delivery plus status counts.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
) -> Result<DashboardTemplate> {
    deliveries::dashboard(state.pool(), &session, user, Area::Admin).await
}

/// Display an empty delivery form.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_page(session: Session, RequireAdmin(user): RequireAdmin) -> DeliveryFormTemplate {
    DeliveryFormTemplate::create(&session, user, DeliveryForm::default(), FieldErrors::default())
        .await
}

/// Handle delivery creation.
#[instrument(skip_all, fields(user_id = %user.id, tracking_number = %form.tracking_number))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Form(form): Form<DeliveryForm>,
) -> Result<Response> {
    csrf::verify(&session, &form.csrf_token).await?;

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(errors) => {
            return Ok(DeliveryFormTemplate::create(&session, user, form, errors)
                .await
                .into_response());
        }
    };

    match DeliveryRepository::new(state.pool())
        .create(&fields, user.id)
        .await
    {
        Ok(delivery) => {
            tracing::info!(delivery_id = %delivery.id, status = %delivery.status, "Delivery created");
            flash::push(&session, Flash::success("Delivery created successfully.")).await?;
            Ok(Redirect::to(DASHBOARD).into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            flash::push(&session, Flash::danger(TRACKING_NUMBER_TAKEN_MESSAGE)).await?;
            Ok(
                DeliveryFormTemplate::create(&session, user, form, FieldErrors::default())
                    .await
                    .into_response(),
            )
        }
        Err(e) => Err(e.into()),
    }
}

/// Display the edit form prefilled from the stored delivery.
#[instrument(skip_all, fields(user_id = %user.id, delivery_id = %id))]
pub async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    DeliveryPath(id): DeliveryPath,
) -> Result<DeliveryFormTemplate> {
    let delivery = DeliveryRepository::new(state.pool()).get(id).await?;
    let form = DeliveryForm::from(&delivery);

    Ok(DeliveryFormTemplate::edit(&session, user, id, form, FieldErrors::default()).await)
}

/// Handle a full delivery update.
///
/// An unknown id is answered with the not-found page even when the submitted
/// form is also invalid.
#[instrument(skip_all, fields(user_id = %user.id, delivery_id = %id))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    DeliveryPath(id): DeliveryPath,
    Form(form): Form<DeliveryForm>,
) -> Result<Response> {
    csrf::verify(&session, &form.csrf_token).await?;

    let repo = DeliveryRepository::new(state.pool());
    repo.get(id).await?;

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(errors) => {
            return Ok(DeliveryFormTemplate::edit(&session, user, id, form, errors)
                .await
                .into_response());
        }
    };

    match repo.update(id, fields, user.id).await {
        Ok(delivery) => {
            tracing::info!(status = %delivery.status, "Delivery updated");
            flash::push(&session, Flash::success("Delivery updated successfully.")).await?;
            Ok(Redirect::to(DASHBOARD).into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            flash::push(&session, Flash::danger(TRACKING_NUMBER_TAKEN_MESSAGE)).await?;
            Ok(
                DeliveryFormTemplate::edit(&session, user, id, form, FieldErrors::default())
                    .await
                    .into_response(),
            )
        }
        Err(e) => Err(e.into()),
    }
}

/// Permanently delete a delivery.
#[instrument(skip_all, fields(user_id = %user.id, delivery_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    DeliveryPath(id): DeliveryPath,
    Form(token): Form<CsrfOnly>,
) -> Result<Redirect> {
    csrf::verify(&session, &token.csrf_token).await?;

    let deleted = DeliveryRepository::new(state.pool())
        .delete(id, user.id)
        .await?;

    flash::push(
        &session,
        Flash::success(format!(
            "Delivery {} has been deleted successfully.",
            deleted.tracking_number
        )),
    )
    .await?;

    Ok(Redirect::to(DASHBOARD))
}

/// Delivery detail with edit and delete actions.
#[instrument(skip_all, fields(user_id = %user.id, delivery_id = %id))]
pub async fn view(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    DeliveryPath(id): DeliveryPath,
) -> Result<DeliveryDetailTemplate> {
    deliveries::detail(state.pool(), &session, user, id, Area::Admin).await
}
