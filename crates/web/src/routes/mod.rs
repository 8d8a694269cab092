//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                  - Redirect to the role's dashboard or login
//!
//! # Auth
//! GET  /auth/login                        - Login page
//! POST /auth/login                        - Login action
//! GET  /auth/logout                       - Logout action
//! GET  /auth/register                     - Register page (admin)
//! POST /auth/register                     - Register action (admin)
//!
//! # Admin (requires admin role)
//! GET  /admin/dashboard                   - All deliveries with status counts
//! GET  /admin/delivery/create             - New delivery form
//! POST /admin/delivery/create             - Create delivery
//! GET  /admin/delivery/{id}/edit          - Edit form
//! POST /admin/delivery/{id}/edit          - Full update
//! POST /admin/delivery/{id}/delete        - Delete
//! GET  /admin/delivery/{id}/view          - Delivery detail
//!
//! # User (requires login)
//! GET  /user/dashboard                    - All deliveries with status counts
//! GET  /user/delivery/{id}/view           - Delivery detail
//! GET  /user/delivery/{id}/update-status  - Status form
//! POST /user/delivery/{id}/update-status  - Status-only update
//! ```

pub mod admin;
pub mod auth;
pub mod deliveries;
pub mod home;
pub mod user;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;
use crate::views::PageContext;

/// Not-found page template.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub page: PageContext,
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/register", get(auth::register_page).post(auth::register))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route(
            "/delivery/create",
            get(admin::create_page).post(admin::create),
        )
        .route("/delivery/{id}/edit", get(admin::edit_page).post(admin::edit))
        .route("/delivery/{id}/delete", post(admin::delete))
        .route("/delivery/{id}/view", get(admin::view))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(user::dashboard))
        .route("/delivery/{id}/view", get(user::view))
        .route(
            "/delivery/{id}/update-status",
            get(user::update_status_page).post(user::update_status),
        )
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
        .nest("/user", user_routes())
        .fallback(not_found)
}

/// Fallback for unknown paths.
pub async fn not_found(session: Session, OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    let page = PageContext::load(&session, user).await;
    (StatusCode::NOT_FOUND, NotFoundTemplate { page })
}
