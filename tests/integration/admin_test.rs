//! Integration tests for administrator routes: account status, roles, and
//! effective permissions.

mod helpers;

use http::StatusCode;
use serde_json::json;

use helpers::{ORG_USER, PASSWORD, TestApp};
use remit_entity::user::UserStatus;

#[tokio::test]
async fn test_unlock_after_lockout() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let user = app
        .create_user("stuck@x.com", ORG_USER, UserStatus::Active)
        .await;
    for _ in 0..5 {
        app.login("stuck@x.com", "Wrong-Guess-00!").await;
    }
    assert_eq!(
        app.login("stuck@x.com", PASSWORD).await.error_code(),
        "ACCOUNT_LOCKED"
    );

    let response = app
        .request(
            "PATCH",
            &format!("/api/v1/users/{}/status", user.id),
            Some(json!({ "status": "ACTIVE", "reason": "Identity confirmed by phone" })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["status"], "ACTIVE");

    assert_eq!(app.login("stuck@x.com", PASSWORD).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_disable_ends_sessions() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let user = app
        .create_user("leaver@x.com", ORG_USER, UserStatus::Active)
        .await;
    let body = app.login_ok("leaver@x.com").await;

    let response = app
        .request(
            "PATCH",
            &format!("/api/v1/users/{}/status", user.id),
            Some(json!({ "status": "disabled" })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "DISABLED");

    let refresh = app
        .request(
            "POST",
            "/api/v1/auth/refresh",
            Some(json!({ "refreshToken": body["refreshToken"] })),
            None,
        )
        .await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.login("leaver@x.com", PASSWORD).await.error_code(),
        "ACCOUNT_INACTIVE"
    );
}

#[tokio::test]
async fn test_status_change_validation() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let user = app
        .create_user("target@x.com", ORG_USER, UserStatus::Active)
        .await;
    let path = format!("/api/v1/users/{}/status", user.id);

    let unknown_status = app
        .request("PATCH", &path, Some(json!({ "status": "FROZEN" })), Some(&admin))
        .await;
    assert_eq!(unknown_status.status, StatusCode::BAD_REQUEST);

    let not_settable = app
        .request("PATCH", &path, Some(json!({ "status": "DELETED" })), Some(&admin))
        .await;
    assert_eq!(not_settable.status, StatusCode::BAD_REQUEST);

    let missing = app
        .request(
            "PATCH",
            &format!("/api/v1/users/{}/status", uuid::Uuid::new_v4()),
            Some(json!({ "status": "SUSPENDED" })),
            Some(&admin),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_routes_require_permissions() {
    let app = TestApp::new().await;
    let user = app
        .create_user("plain@x.com", ORG_USER, UserStatus::Active)
        .await;
    let body = app.login_ok("plain@x.com").await;
    let token = body["accessToken"].as_str();

    let status = app
        .request(
            "PATCH",
            &format!("/api/v1/users/{}/status", user.id),
            Some(json!({ "status": "ACTIVE" })),
            token,
        )
        .await;
    assert_eq!(status.status, StatusCode::FORBIDDEN);

    let roles = app.request("GET", "/api/v1/roles", None, token).await;
    assert_eq!(roles.status, StatusCode::FORBIDDEN);

    let permissions = app
        .request(
            "GET",
            &format!("/api/v1/users/{}/permissions", user.id),
            None,
            token,
        )
        .await;
    assert_eq!(permissions.status, StatusCode::FORBIDDEN);

    let anonymous = app.request("GET", "/api/v1/roles", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_roles() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let response = app.request("GET", "/api/v1/roles", None, Some(&admin)).await;
    assert_eq!(response.status, StatusCode::OK);
    let roles = response.body["roles"].as_array().expect("roles");
    assert_eq!(roles.len(), 2);
    assert_eq!(roles[0]["name"], "ORG_ADMIN");
    assert_eq!(roles[1]["name"], "ORG_USER");
    assert!(roles[0].get("isSystem").is_some());
}

#[tokio::test]
async fn test_user_permissions() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let user = app
        .create_user("teller@x.com", ORG_USER, UserStatus::Active)
        .await;

    let response = app
        .request(
            "GET",
            &format!("/api/v1/users/{}/permissions", user.id),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.uuid("userId"), user.id);
    let codes: Vec<&str> = response.body["permissions"]
        .as_array()
        .expect("permissions")
        .iter()
        .filter_map(|p| p.as_str())
        .collect();
    assert!(codes.contains(&"transactions:create"));
    assert!(!codes.contains(&"users:create"));
    let mut sorted = codes.clone();
    sorted.sort_unstable();
    assert_eq!(codes, sorted);

    let missing = app
        .request(
            "GET",
            &format!("/api/v1/users/{}/permissions", uuid::Uuid::new_v4()),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
