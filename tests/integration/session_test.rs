//! Integration tests for session listing, revocation and health.

mod helpers;

use http::StatusCode;
use serde_json::json;

use helpers::{ORG_USER, TestApp};
use remit_cache::keys;
use remit_core::traits::CacheProvider;
use remit_entity::user::UserStatus;

#[tokio::test]
async fn test_list_sessions_marks_current() {
    let app = TestApp::new().await;
    app.create_user("multi@x.com", ORG_USER, UserStatus::Active)
        .await;

    let first = app.login_ok("multi@x.com").await;
    let second = app.login_ok("multi@x.com").await;
    assert_ne!(first["sessionId"], second["sessionId"]);

    let response = app
        .request(
            "GET",
            "/api/v1/auth/sessions",
            None,
            second["accessToken"].as_str(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let sessions = response.body.as_array().expect("session list");
    assert_eq!(sessions.len(), 2);
    let current: Vec<_> = sessions.iter().filter(|s| s["current"] == true).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0]["id"], second["sessionId"]);
}

#[tokio::test]
async fn test_sessions_are_scoped_to_identity() {
    let app = TestApp::new().await;
    app.create_user("one@x.com", ORG_USER, UserStatus::Active)
        .await;
    app.create_user("two@x.com", ORG_USER, UserStatus::Active)
        .await;
    app.login_ok("one@x.com").await;
    let two = app.login_ok("two@x.com").await;

    let response = app
        .request(
            "GET",
            "/api/v1/auth/sessions",
            None,
            two["accessToken"].as_str(),
        )
        .await;
    assert_eq!(response.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_revoke_all_sessions() {
    let app = TestApp::new().await;
    app.create_user("all@x.com", ORG_USER, UserStatus::Active)
        .await;
    let other = app.login_ok("all@x.com").await;
    let current = app.login_ok("all@x.com").await;
    let access = current["accessToken"].as_str().unwrap();

    let response = app
        .request("DELETE", "/api/v1/auth/sessions", None, Some(access))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["revoked"], 2);
    assert!(response.cookie("refreshToken").is_some());

    let refresh = app
        .request(
            "POST",
            "/api/v1/auth/refresh",
            Some(json!({ "refreshToken": other["refreshToken"] })),
            None,
        )
        .await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);

    let me = app
        .request("GET", "/api/v1/auth/me", None, Some(access))
        .await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);

    assert_eq!(app.state.sessions.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_refresh_fails_once_session_is_gone() {
    let app = TestApp::new().await;
    app.create_user("gone@x.com", ORG_USER, UserStatus::Active)
        .await;
    let body = app.login_ok("gone@x.com").await;
    let session_id: uuid::Uuid = body["sessionId"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("session id");

    app.state.sessions.delete(session_id).await.unwrap();

    let refresh = app
        .request(
            "POST",
            "/api/v1/auth/refresh",
            Some(json!({ "refreshToken": body["refreshToken"] })),
            None,
        )
        .await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_resumes_session_that_went_idle() {
    let app = TestApp::new().await;
    app.create_user("idle@x.com", ORG_USER, UserStatus::Active)
        .await;
    let body = app.login_ok("idle@x.com").await;
    let session_id: uuid::Uuid = body["sessionId"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("session id");

    // Thirty idle minutes later the record has lapsed.
    let mut session = app.state.sessions.get(session_id).await.unwrap();
    session.expires_at = chrono::Utc::now() - chrono::Duration::minutes(1);
    app.state
        .cache
        .set_json(
            &keys::session(session_id),
            &session,
            std::time::Duration::from_secs(3600),
        )
        .await
        .unwrap();

    let refresh = app
        .request(
            "POST",
            "/api/v1/auth/refresh",
            Some(json!({ "refreshToken": body["refreshToken"] })),
            None,
        )
        .await;
    assert_eq!(refresh.status, StatusCode::OK, "{:?}", refresh.body);

    let listed = app
        .request(
            "GET",
            "/api/v1/auth/sessions",
            None,
            refresh.body["accessToken"].as_str(),
        )
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body[0]["id"], body["sessionId"]);
    assert_eq!(listed.body[0]["current"], true);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/v1/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["database"], "in-memory");
    assert_eq!(response.body["cache"], "connected");
    assert_eq!(response.body["sessions"]["stored"], 0);

    app.create_user("hc@x.com", ORG_USER, UserStatus::Active)
        .await;
    app.login_ok("hc@x.com").await;
    app.login_ok("hc@x.com").await;

    let response = app.request("GET", "/api/v1/health", None, None).await;
    assert_eq!(response.body["sessions"]["stored"], 2);
    assert_eq!(response.body["sessions"]["activeUsers"], 1);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/api/v1/nowhere", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
