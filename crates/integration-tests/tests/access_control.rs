//! Role and login enforcement on protected routes.
//!
//! Every request here is rejected before a handler touches the database.

use axum::http::StatusCode;

use logistik_core::Role;
use logistik_integration_tests::{TestClient, app, app_with_test_login, body_text, location};

const PROTECTED_GETS: &[&str] = &[
    "/admin/dashboard",
    "/admin/delivery/create",
    "/admin/delivery/1/edit",
    "/admin/delivery/1/view",
    "/user/dashboard",
    "/user/delivery/1/view",
    "/user/delivery/1/update-status",
    "/auth/register",
    "/auth/logout",
];

#[tokio::test]
async fn test_anonymous_requests_redirect_to_login_with_next() {
    for path in PROTECTED_GETS {
        let mut client = TestClient::new(app());
        let response = client.get(path).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        let expected = format!("/auth/login?next={}", path.replace('/', "%2F"));
        assert_eq!(location(&response), Some(expected.as_str()), "{path}");
    }
}

#[tokio::test]
async fn test_anonymous_posts_redirect_to_login() {
    let mut client = TestClient::new(app());

    let response = client.post_form("/admin/delivery/1/delete", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        Some("/auth/login?next=%2Fadmin%2Fdelivery%2F1%2Fdelete")
    );

    let response = client
        .post_form("/user/delivery/1/update-status", "status=delivered")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_notice_is_shown_once() {
    let mut client = TestClient::new(app());
    client.get("/user/dashboard").await;

    let html = body_text(client.get("/auth/login").await).await;
    assert!(html.contains("Please log in to access this page."));

    let html = body_text(client.get("/auth/login").await).await;
    assert!(!html.contains("Please log in to access this page."));
}

#[tokio::test]
async fn test_user_role_is_bounced_from_admin_pages() {
    let admin_only = [
        "/admin/dashboard",
        "/admin/delivery/create",
        "/admin/delivery/7/edit",
        "/admin/delivery/7/view",
        "/auth/register",
    ];

    for path in admin_only {
        let mut client = TestClient::signed_in(Role::User).await;
        let response = client.get(path).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/user/dashboard"), "{path}");
    }
}

#[tokio::test]
async fn test_user_role_cannot_edit_or_delete() {
    let mut client = TestClient::signed_in(Role::User).await;

    let response = client
        .post_form("/admin/delivery/7/edit", "tracking_number=TRK9&status=late")
        .await;
    assert_eq!(location(&response), Some("/user/dashboard"));

    let response = client.post_form("/admin/delivery/7/delete", "").await;
    assert_eq!(location(&response), Some("/user/dashboard"));

    let response = client
        .post_form(
            "/auth/register",
            "username=mallory&email=m%40example.com&password=secret1&role=admin",
        )
        .await;
    assert_eq!(location(&response), Some("/user/dashboard"));
}

#[tokio::test]
async fn test_access_denied_notice_is_flashed() {
    let mut client = TestClient::signed_in(Role::User).await;
    client.get("/admin/dashboard").await;

    // Any rendered page shows pending notices; the 404 page needs no database.
    let html = body_text(client.get("/missing").await).await;
    assert!(html.contains("Access denied. Admin privileges required."));
}

#[tokio::test]
async fn test_root_redirects_by_role() {
    let mut user = TestClient::signed_in(Role::User).await;
    assert_eq!(location(&user.get("/").await), Some("/user/dashboard"));

    let mut admin = TestClient::signed_in(Role::Admin).await;
    assert_eq!(location(&admin.get("/").await), Some("/admin/dashboard"));
}

#[tokio::test]
async fn test_signed_in_user_skips_login_page() {
    let mut client = TestClient::signed_in(Role::Admin).await;
    let response = client.get("/auth/login").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/admin/dashboard"));
}

#[tokio::test]
async fn test_admin_sees_registration_form() {
    let mut client = TestClient::signed_in(Role::Admin).await;
    let response = client.get("/auth/register").await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Register User"));
    assert!(html.contains(r#"<option value="admin""#));
}

#[tokio::test]
async fn test_admin_sees_empty_delivery_form() {
    let mut client = TestClient::signed_in(Role::Admin).await;
    let response = client.get("/admin/delivery/create").await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Create Delivery"));
    assert!(html.contains(r#"<option value="ongoing" selected>"#));
}

#[tokio::test]
async fn test_invalid_delivery_form_is_rerendered_with_errors() {
    let mut client = TestClient::signed_in(Role::Admin).await;
    let token = client.csrf_token("/admin/delivery/create").await;
    let response = client
        .post_form(
            "/admin/delivery/create",
            &format!(
                "csrf_token={token}&tracking_number=TRK1&recipient_name=&recipient_address=1+Main+St&recipient_phone=555&weight=-1&status=ongoing"
            ),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Recipient name is required."));
    assert!(html.contains(r#"value="TRK1""#));
}

#[tokio::test]
async fn test_oversized_weight_is_a_form_error() {
    let mut client = TestClient::signed_in(Role::Admin).await;
    let token = client.csrf_token("/admin/delivery/create").await;
    let response = client
        .post_form(
            "/admin/delivery/create",
            &format!(
                "csrf_token={token}&tracking_number=TRK2&recipient_name=Ada&recipient_address=1+Main+St&recipient_phone=555&weight=1000000000&status=ongoing"
            ),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("weight cannot exceed 99999999.99 kg"));
}

#[tokio::test]
async fn test_forms_without_session_token_are_forbidden() {
    let mut client = TestClient::signed_in(Role::Admin).await;

    let response = client
        .post_form(
            "/admin/delivery/create",
            "tracking_number=TRK3&recipient_name=Ada&recipient_address=1+Main+St&recipient_phone=555&status=ongoing",
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .post_form("/admin/delivery/1/delete", "csrf_token=forged")
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .post_form("/user/delivery/1/update-status", "status=delivered")
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .post_form(
            "/auth/register",
            "username=mallory&email=m%40example.com&password=secret1&role=admin",
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut anonymous = TestClient::new(app());
    let response = anonymous
        .post_form("/auth/login", "username=admin&password=admin123")
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_logout_link_needs_session_token() {
    let mut client = TestClient::signed_in(Role::User).await;

    let response = client.get("/auth/logout").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client.get("/auth/logout?csrf_token=forged").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Still signed in.
    let response = client.get("/").await;
    assert_eq!(location(&response), Some("/user/dashboard"));
}

#[tokio::test]
async fn test_malformed_delivery_ids_are_not_found() {
    let mut user = TestClient::signed_in(Role::User).await;
    for path in [
        "/user/delivery/abc/view",
        "/user/delivery/99999999999/view",
        "/user/delivery/1.5/update-status",
    ] {
        let response = user.get(path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        assert!(body_text(response).await.contains("Page not found"), "{path}");
    }

    let mut admin = TestClient::signed_in(Role::Admin).await;
    for path in ["/admin/delivery/abc/view", "/admin/delivery/-/edit"] {
        let response = admin.get(path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn test_malformed_ids_still_require_login() {
    let mut client = TestClient::new(app());
    let response = client.get("/user/delivery/abc/view").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        Some("/auth/login?next=%2Fuser%2Fdelivery%2Fabc%2Fview")
    );
}

#[tokio::test]
async fn test_logout_destroys_session() {
    let mut client = TestClient::new(app_with_test_login());
    client.get("/test/login-as/user").await;

    // The not-found page carries the navigation bar.
    let token = client.csrf_token("/missing").await;
    let response = client.get(&format!("/auth/logout?csrf_token={token}")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/auth/login?success=logged_out"));

    let response = client.get("/user/dashboard").await;
    assert_eq!(
        location(&response),
        Some("/auth/login?next=%2Fuser%2Fdashboard")
    );
}
