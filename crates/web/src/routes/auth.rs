//! Authentication route handlers.
//!
//! Password login, logout, and admin-only account registration.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::csrf;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::flash::{self, Flash};
use crate::forms::{CsrfOnly, FieldErrors, LoginForm, RegisterForm, safe_next};
use crate::middleware::{OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::{AuthError, AuthService, NewUser};
use crate::state::AppState;
use crate::views::{PageContext, SelectOption};

/// Shown for any failed login, whichever part was wrong.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password.";

/// Shown on the login page after logging out.
pub const LOGGED_OUT_MESSAGE: &str = "You have been logged out.";

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub username: String,
    pub next: String,
    pub success: Option<&'static str>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub username: String,
    pub email: String,
    pub roles: Vec<SelectOption>,
    pub errors: FieldErrors,
}

impl RegisterTemplate {
    async fn render_form(
        session: &Session,
        user: CurrentUser,
        form: &RegisterForm,
        errors: FieldErrors,
    ) -> Self {
        Self {
            page: PageContext::load(session, Some(user)).await,
            username: form.username.clone(),
            email: form.email.clone(),
            roles: SelectOption::roles(&form.role),
            errors,
        }
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
///
/// Someone already signed in is sent straight to their dashboard.
#[instrument(skip_all)]
pub async fn login_page(
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    if let Some(user) = user {
        return Redirect::to(user.dashboard_path()).into_response();
    }

    let success = match query.success.as_deref() {
        Some("logged_out") => Some(LOGGED_OUT_MESSAGE),
        _ => None,
    };

    LoginTemplate {
        page: PageContext::load(&session, None).await,
        username: String::new(),
        next: query.next.unwrap_or_default(),
        success,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    csrf::verify(&session, &form.csrf_token).await?;
    let service = AuthService::new(state.pool());

    match service.verify(form.username.trim(), &form.password).await {
        Ok(user) => {
            let current = CurrentUser::from(&user);
            set_current_user(&session, &current).await?;
            set_sentry_user(&user.id, &user.username);
            tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

            let target = safe_next(&form.next).unwrap_or_else(|| current.dashboard_path());
            Ok(Redirect::to(target).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Login failed");
            flash::push(&session, Flash::danger(INVALID_CREDENTIALS_MESSAGE)).await?;

            Ok(LoginTemplate {
                page: PageContext::load(&session, None).await,
                username: form.username,
                next: form.next,
                success: None,
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Destroy the session and return to the login page.
///
/// The link carries the form token so another site cannot sign users out.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn logout(
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(token): Query<CsrfOnly>,
) -> Result<Redirect> {
    csrf::verify(&session, &token.csrf_token).await?;
    clear_current_user(&session).await?;
    clear_sentry_user();
    tracing::info!("User logged out");
    Ok(Redirect::to("/auth/login?success=logged_out"))
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn register_page(session: Session, RequireAdmin(user): RequireAdmin) -> RegisterTemplate {
    let form = RegisterForm {
        role: logistik_core::Role::default().as_str().to_owned(),
        ..RegisterForm::default()
    };
    RegisterTemplate::render_form(&session, user, &form, FieldErrors::default()).await
}

/// Handle registration form submission.
#[instrument(skip_all, fields(user_id = %user.id, username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    csrf::verify(&session, &form.csrf_token).await?;

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(RegisterTemplate::render_form(&session, user, &form, errors)
                .await
                .into_response());
        }
    };

    let new_user = NewUser {
        username: &valid.username,
        email: valid.email.as_str(),
        password: &form.password,
        role: valid.role,
    };

    match AuthService::new(state.pool()).register(&new_user).await {
        Ok(created) => {
            flash::push(
                &session,
                Flash::success(format!(
                    "User {} has been registered successfully.",
                    created.username
                )),
            )
            .await?;
            Ok(Redirect::to("/admin/dashboard").into_response())
        }
        Err(AuthError::Conflict { field }) => {
            flash::push(&session, Flash::danger(field.message())).await?;
            Ok(RegisterTemplate::render_form(&session, user, &form, FieldErrors::default())
                .await
                .into_response())
        }
        Err(AuthError::Validation(message)) => {
            flash::push(&session, Flash::danger(message)).await?;
            Ok(RegisterTemplate::render_form(&session, user, &form, FieldErrors::default())
                .await
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}
