//! Repository and authentication behaviour against a real `PostgreSQL`.
//!
//! These tests need `LOGISTIK_DATABASE_URL` (or `DATABASE_URL`) pointing at a
//! database they may write to. They create their own uniquely named rows and
//! run one at a time.
//!
//! ```bash
//! LOGISTIK_DATABASE_URL=postgres://localhost/logistik_test \
//!     cargo test -p logistik-integration-tests --test store -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicU32, Ordering};

use axum::http::StatusCode;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tokio::sync::{Mutex, MutexGuard};

use logistik_core::{DeliveryFields, DeliveryId, DeliveryStatus, Role, Weight};
use logistik_integration_tests::{TestClient, app_with_test_login_for, body_text, test_config};
use logistik_web::bootstrap;
use logistik_web::config::database_url_from_env;
use logistik_web::db::{self, DeliveryRepository, RepositoryError, UserRepository};
use logistik_web::models::User;
use logistik_web::services::{AuthError, AuthService, NewUser};
use logistik_web::state::AppState;

const REQUIRES_DB: &str = "Requires PostgreSQL (set LOGISTIK_DATABASE_URL)";

/// Counting and listing must not interleave with another test's writes.
static SERIAL: Mutex<()> = Mutex::const_new(());

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// A suffix no other row in the database has.
fn unique(prefix: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let n = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}{nanos}{n}")
}

async fn setup() -> (MutexGuard<'static, ()>, PgPool) {
    let guard = SERIAL.lock().await;
    let url = database_url_from_env().unwrap_or_else(|_| panic!("{REQUIRES_DB}"));
    let pool = db::create_pool(&url).await.unwrap();
    bootstrap::run(&pool, &test_config().demo_users).await.unwrap();
    (guard, pool)
}

async fn register(pool: &PgPool, role: Role, password: &str) -> User {
    let username = unique("u");
    let email = format!("{username}@logistik.com");
    AuthService::new(pool)
        .register(&NewUser {
            username: &username,
            email: &email,
            password,
            role,
        })
        .await
        .unwrap()
}

fn fields(tracking_number: &str, status: DeliveryStatus) -> DeliveryFields {
    DeliveryFields {
        tracking_number: tracking_number.to_owned(),
        recipient_name: "Ada Lovelace".to_owned(),
        recipient_address: "12 St James's Square".to_owned(),
        recipient_phone: "555-0100".to_owned(),
        description: Some("Analytical engine parts".to_owned()),
        weight: Some(Weight::parse("2.5").unwrap()),
        estimated_delivery_date: NaiveDate::from_ymd_opt(2030, 1, 15),
        status,
    }
}

// =============================================================================
// Deliveries
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (set LOGISTIK_DATABASE_URL)"]
async fn test_duplicate_tracking_number_on_create_is_a_conflict() {
    let (_guard, pool) = setup().await;
    let admin = register(&pool, Role::Admin, "admin123").await;
    let repo = DeliveryRepository::new(&pool);
    let tn = unique("T");

    let first = repo
        .create(&fields(&tn, DeliveryStatus::Ongoing), admin.id)
        .await
        .unwrap();

    let mut other = fields(&tn, DeliveryStatus::Late);
    other.recipient_name = "Someone Else".to_owned();
    let err = repo.create(&other, admin.id).await.unwrap_err();
    assert!(
        matches!(&err, RepositoryError::Conflict(field) if field == "tracking_number"),
        "{err:?}"
    );

    let stored = repo.get(first.id).await.unwrap();
    assert_eq!(stored, first);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set LOGISTIK_DATABASE_URL)"]
async fn test_edit_may_keep_its_own_tracking_number_but_not_take_another() {
    let (_guard, pool) = setup().await;
    let admin = register(&pool, Role::Admin, "admin123").await;
    let repo = DeliveryRepository::new(&pool);
    let (tn_a, tn_b) = (unique("A"), unique("B"));

    let a = repo
        .create(&fields(&tn_a, DeliveryStatus::Ongoing), admin.id)
        .await
        .unwrap();
    let b = repo
        .create(&fields(&tn_b, DeliveryStatus::Ongoing), admin.id)
        .await
        .unwrap();

    let mut same = fields(&tn_a, DeliveryStatus::InRoute);
    same.recipient_name = "Charles Babbage".to_owned();
    let updated = repo.update(a.id, same, admin.id).await.unwrap();
    assert_eq!(updated.tracking_number, tn_a);
    assert_eq!(updated.recipient_name, "Charles Babbage");
    assert_eq!(updated.updated_by, Some(admin.id));

    let err = repo
        .update(b.id, fields(&tn_a, DeliveryStatus::Ongoing), admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)), "{err:?}");
    assert_eq!(repo.get(b.id).await.unwrap().tracking_number, tn_b);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set LOGISTIK_DATABASE_URL)"]
async fn test_missing_delivery_is_not_found() {
    let (_guard, pool) = setup().await;
    let user = register(&pool, Role::User, "user123").await;
    let repo = DeliveryRepository::new(&pool);
    let missing = DeliveryId::new(i32::MAX);

    assert!(matches!(repo.get(missing).await, Err(RepositoryError::NotFound)));
    assert!(matches!(
        repo.delete(missing, user.id).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        repo.update_status(missing, DeliveryStatus::Delivered, user.id).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        repo.update(missing, fields(&unique("M"), DeliveryStatus::Ongoing), user.id)
            .await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set LOGISTIK_DATABASE_URL)"]
async fn test_delete_removes_the_row() {
    let (_guard, pool) = setup().await;
    let admin = register(&pool, Role::Admin, "admin123").await;
    let repo = DeliveryRepository::new(&pool);
    let tn = unique("D");

    let created = repo
        .create(&fields(&tn, DeliveryStatus::Ongoing), admin.id)
        .await
        .unwrap();
    let deleted = repo.delete(created.id, admin.id).await.unwrap();
    assert_eq!(deleted.tracking_number, tn);

    assert!(matches!(repo.get(created.id).await, Err(RepositoryError::NotFound)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set LOGISTIK_DATABASE_URL)"]
async fn test_counts_total_matches_listing_and_newest_comes_first() {
    let (_guard, pool) = setup().await;
    let admin = register(&pool, Role::Admin, "admin123").await;
    let repo = DeliveryRepository::new(&pool);

    let older = repo
        .create(&fields(&unique("O"), DeliveryStatus::Late), admin.id)
        .await
        .unwrap();
    let newer = repo
        .create(&fields(&unique("N"), DeliveryStatus::Delivered), admin.id)
        .await
        .unwrap();

    let listing = repo.list().await.unwrap();
    let counts = repo.count_by_status().await.unwrap();
    assert_eq!(counts.total(), u64::try_from(listing.len()).unwrap());

    let position = |id| listing.iter().position(|d| d.id == id).unwrap();
    assert!(position(newer.id) < position(older.id));
    assert!(
        listing
            .windows(2)
            .all(|w| (w[0].created_at, w[0].id.as_i32()) >= (w[1].created_at, w[1].id.as_i32()))
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set LOGISTIK_DATABASE_URL)"]
async fn test_status_updates_stamp_actual_date_once() {
    let (_guard, pool) = setup().await;
    let admin = register(&pool, Role::Admin, "admin123").await;
    let user = register(&pool, Role::User, "user123").await;
    let repo = DeliveryRepository::new(&pool);

    let created = repo
        .create(&fields(&unique("S"), DeliveryStatus::Ongoing), admin.id)
        .await
        .unwrap();
    assert_eq!(created.actual_delivery_date, None);

    let delivered = repo
        .update_status(created.id, DeliveryStatus::Delivered, user.id)
        .await
        .unwrap();
    let stamped = delivered.actual_delivery_date;
    assert!(stamped.is_some());
    assert_eq!(delivered.updated_by, Some(user.id));

    let reopened = repo
        .update_status(created.id, DeliveryStatus::InRoute, user.id)
        .await
        .unwrap();
    assert_eq!(reopened.status, DeliveryStatus::InRoute);
    assert_eq!(reopened.actual_delivery_date, stamped);

    let stored = repo.get(created.id).await.unwrap();
    assert_eq!(stored.actual_delivery_date, stamped);
    assert_eq!(stored.status, DeliveryStatus::InRoute);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set LOGISTIK_DATABASE_URL)"]
async fn test_created_as_delivered_is_stamped() {
    let (_guard, pool) = setup().await;
    let admin = register(&pool, Role::Admin, "admin123").await;

    let created = DeliveryRepository::new(&pool)
        .create(&fields(&unique("C"), DeliveryStatus::Delivered), admin.id)
        .await
        .unwrap();
    assert!(created.actual_delivery_date.is_some());
}

// =============================================================================
// Users and authentication
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (set LOGISTIK_DATABASE_URL)"]
async fn test_verify_credentials() {
    let (_guard, pool) = setup().await;
    let user = register(&pool, Role::User, "correct-horse").await;
    let auth = AuthService::new(&pool);

    let verified = auth.verify(&user.username, "correct-horse").await.unwrap();
    assert_eq!(verified.id, user.id);
    assert_eq!(verified.role, Role::User);

    assert!(matches!(
        auth.verify(&user.username, "wrong-horse").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.verify(&unique("nobody"), "correct-horse").await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (set LOGISTIK_DATABASE_URL)"]
async fn test_register_rejects_taken_username_and_email() {
    let (_guard, pool) = setup().await;
    let existing = register(&pool, Role::User, "user123").await;
    let auth = AuthService::new(&pool);

    let fresh_email = format!("{}@logistik.com", unique("e"));
    let err = auth
        .register(&NewUser {
            username: &existing.username,
            email: &fresh_email,
            password: "secret1",
            role: Role::Admin,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Conflict { .. }), "{err:?}");

    let fresh_name = unique("n");
    let err = auth
        .register(&NewUser {
            username: &fresh_name,
            email: existing.email.as_str(),
            password: "secret1",
            role: Role::User,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Conflict { .. }), "{err:?}");

    let users = UserRepository::new(&pool);
    assert!(!users.username_exists(&fresh_name).await.unwrap());
    assert_eq!(
        users.get_by_id(existing.id).await.unwrap().map(|u| u.role),
        Some(Role::User)
    );
}

// =============================================================================
// Routes over a real database
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (set LOGISTIK_DATABASE_URL)"]
async fn test_invalid_edit_of_missing_delivery_is_not_found() {
    let (_guard, pool) = setup().await;
    let app = app_with_test_login_for(AppState::new(test_config(), pool));
    let mut client = TestClient::signed_in_to(app, Role::Admin).await;
    let token = client.csrf_token("/missing").await;

    let response = client
        .post_form(
            &format!("/admin/delivery/{}/edit", i32::MAX),
            &format!("csrf_token={token}&tracking_number=&recipient_name="),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Page not found"));
}
