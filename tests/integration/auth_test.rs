//! Integration tests for authentication flow.

mod helpers;

use http::StatusCode;
use serde_json::json;

use helpers::{ORG_USER, PASSWORD, TestApp};
use remit_entity::user::UserStatus;

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new().await;
    app.create_user("a@x.com", ORG_USER, UserStatus::Active)
        .await;

    let response = app.login("a@x.com", PASSWORD).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.body["accessToken"].as_str().unwrap().is_empty());
    assert!(!response.body["refreshToken"].as_str().unwrap().is_empty());
    assert_eq!(response.body["user"]["email"], "a@x.com");
    assert_eq!(response.body["user"]["role"], "ORG_USER");
    assert!(response.body["user"].get("passwordHash").is_none());

    let access = response.cookie("accessToken").expect("access cookie");
    assert!(access.contains("HttpOnly"));
    assert!(access.contains("Max-Age=900"));
    let refresh = response.cookie("refreshToken").expect("refresh cookie");
    assert!(refresh.contains("Max-Age=604800"));
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let app = TestApp::new().await;
    app.create_user("mixed@x.com", ORG_USER, UserStatus::Active)
        .await;

    let response = app.login("  MIXED@X.com ", PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_invalid_password_and_unknown_email_look_the_same() {
    let app = TestApp::new().await;
    app.create_user("b@x.com", ORG_USER, UserStatus::Active)
        .await;

    let wrong = app.login("b@x.com", "not-the-password").await;
    let unknown = app.login("nobody@x.com", PASSWORD).await;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.error_code(), "INVALID_CREDENTIAL");
    assert_eq!(wrong.body["message"], unknown.body["message"]);
}

#[tokio::test]
async fn test_locked_status_rejects_correct_password() {
    let app = TestApp::new().await;
    app.create_user("locked@x.com", ORG_USER, UserStatus::Locked)
        .await;

    let response = app.login("locked@x.com", PASSWORD).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "ACCOUNT_LOCKED");
}

#[tokio::test]
async fn test_disabled_account_is_inactive() {
    let app = TestApp::new().await;
    app.create_user("off@x.com", ORG_USER, UserStatus::Disabled)
        .await;

    let response = app.login("off@x.com", PASSWORD).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "ACCOUNT_INACTIVE");
}

#[tokio::test]
async fn test_five_failures_lock_out_the_correct_password() {
    let app = TestApp::new().await;
    let user = app
        .create_user("brute@x.com", ORG_USER, UserStatus::Active)
        .await;

    for _ in 0..5 {
        let response = app.login("brute@x.com", "Wrong-Guess-00!").await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let response = app.login("brute@x.com", PASSWORD).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "ACCOUNT_LOCKED");

    // Once the window elapses the account unlocks lazily.
    app.store
        .set_locked_until(user.id, Some(chrono::Utc::now() - chrono::Duration::seconds(1)))
        .await;
    let response = app.login("brute@x.com", PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_me_with_bearer_and_cookie() {
    let app = TestApp::new().await;
    app.create_user("me@x.com", ORG_USER, UserStatus::Active)
        .await;
    let login = app.login("me@x.com", PASSWORD).await;
    let token = login.body["accessToken"].as_str().unwrap();

    let response = app
        .request("GET", "/api/v1/auth/me", None, Some(token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["email"], "me@x.com");

    let response = app
        .request_with_cookie(
            "GET",
            "/api/v1/auth/me",
            None,
            &format!("accessToken={token}"),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/v1/auth/me", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "TOKEN_INVALID");

    let response = app
        .request("GET", "/api/v1/auth/me", None, Some("not.a.jwt"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_cannot_be_used_as_access_token() {
    let app = TestApp::new().await;
    app.create_user("swap@x.com", ORG_USER, UserStatus::Active)
        .await;
    let body = app.login_ok("swap@x.com").await;

    let response = app
        .request(
            "GET",
            "/api/v1/auth/me",
            None,
            body["refreshToken"].as_str(),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let app = TestApp::new().await;
    app.create_user("r@x.com", ORG_USER, UserStatus::Active)
        .await;
    let body = app.login_ok("r@x.com").await;
    let old_refresh = body["refreshToken"].as_str().unwrap().to_string();

    let response = app
        .request(
            "POST",
            "/api/v1/auth/refresh",
            Some(json!({ "refreshToken": old_refresh })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let new_access = response.body["accessToken"].as_str().unwrap().to_string();
    assert!(response.cookie("accessToken").is_some());

    let me = app
        .request("GET", "/api/v1/auth/me", None, Some(&new_access))
        .await;
    assert_eq!(me.status, StatusCode::OK);

    // The presented refresh token was revoked by the rotation.
    let replay = app
        .request(
            "POST",
            "/api/v1/auth/refresh",
            Some(json!({ "refreshToken": old_refresh })),
            None,
        )
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_from_cookie() {
    let app = TestApp::new().await;
    app.create_user("rc@x.com", ORG_USER, UserStatus::Active)
        .await;
    let body = app.login_ok("rc@x.com").await;
    let refresh = body["refreshToken"].as_str().unwrap();

    let response = app
        .request_with_cookie(
            "POST",
            "/api/v1/auth/refresh",
            None,
            &format!("refreshToken={refresh}"),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let missing = app
        .request("POST", "/api/v1/auth/refresh", None, None)
        .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_access_token_and_clears_cookies() {
    let app = TestApp::new().await;
    app.create_user("out@x.com", ORG_USER, UserStatus::Active)
        .await;
    let body = app.login_ok("out@x.com").await;
    let access = body["accessToken"].as_str().unwrap();
    let refresh = body["refreshToken"].as_str().unwrap();

    let response = app
        .request(
            "POST",
            "/api/v1/auth/logout",
            Some(json!({ "refreshToken": refresh })),
            Some(access),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let cleared = response.cookie("accessToken").expect("cleared cookie");
    assert!(cleared.contains("Max-Age=-1"));

    let me = app
        .request("GET", "/api/v1/auth/me", None, Some(access))
        .await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);

    let refreshed = app
        .request(
            "POST",
            "/api/v1/auth/refresh",
            Some(json!({ "refreshToken": refresh })),
            None,
        )
        .await;
    assert_eq!(refreshed.status, StatusCode::UNAUTHORIZED);

    // Logging out again, with or without the dead token, still succeeds.
    let again = app
        .request("POST", "/api/v1/auth/logout", None, Some(access))
        .await;
    assert_eq!(again.status, StatusCode::OK);
    let anonymous = app.request("POST", "/api/v1/auth/logout", None, None).await;
    assert_eq!(anonymous.status, StatusCode::OK);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new().await;
    app.create_user("pw@x.com", ORG_USER, UserStatus::Active)
        .await;
    let body = app.login_ok("pw@x.com").await;
    let access = body["accessToken"].as_str().unwrap();

    let wrong = app
        .request(
            "POST",
            "/api/v1/auth/change-password",
            Some(json!({ "currentPassword": "nope", "newPassword": "Harbor-Lantern-57?" })),
            Some(access),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);

    let weak = app
        .request(
            "POST",
            "/api/v1/auth/change-password",
            Some(json!({ "currentPassword": PASSWORD, "newPassword": "short" })),
            Some(access),
        )
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);

    let ok = app
        .request(
            "POST",
            "/api/v1/auth/change-password",
            Some(json!({ "currentPassword": PASSWORD, "newPassword": "Harbor-Lantern-57?" })),
            Some(access),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);

    assert_eq!(
        app.login("pw@x.com", PASSWORD).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.login("pw@x.com", "Harbor-Lantern-57?").await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_register_creates_pending_identity() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/v1/auth/register",
            Some(json!({
                "email": "new@x.com",
                "password": "Quartz-Willow-19#",
                "firstName": "Nia",
                "lastName": "Okafor",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["status"], "PENDING_VERIFICATION");
    assert_eq!(response.body["role"], "ORG_USER");

    // Pending identities cannot log in until onboarded.
    let login = app.login("new@x.com", "Quartz-Willow-19#").await;
    assert_eq!(login.status, StatusCode::FORBIDDEN);

    let duplicate = app
        .request(
            "POST",
            "/api/v1/auth/register",
            Some(json!({
                "email": "NEW@x.com",
                "password": "Quartz-Willow-19#",
                "firstName": "Nia",
                "lastName": "Okafor",
            })),
            None,
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_body_reports_fields() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/v1/auth/register",
            Some(json!({
                "email": "not-an-email",
                "password": "Quartz-Willow-19#",
                "firstName": "",
                "lastName": "Okafor",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION");
    assert!(response.body["details"].get("email").is_some());

    let malformed = app
        .request("POST", "/api/v1/auth/login", Some(json!({ "email": 5 })), None)
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_activity_lists_own_events_newest_first() {
    let app = TestApp::new().await;
    app.create_user("log@x.com", ORG_USER, UserStatus::Active)
        .await;
    app.create_user("else@x.com", ORG_USER, UserStatus::Active)
        .await;
    app.login("log@x.com", "Wrong-Guess-00!").await;
    app.login_ok("else@x.com").await;
    let body = app.login_ok("log@x.com").await;
    let access = body["accessToken"].as_str().unwrap();

    let response = app
        .request("GET", "/api/v1/auth/activity", None, Some(access))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let entries = response.body.as_array().expect("activity list");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["activityType"], "LOGIN");
    assert_eq!(entries[1]["activityType"], "FAILED_LOGIN");

    let limited = app
        .request("GET", "/api/v1/auth/activity?limit=1", None, Some(access))
        .await;
    assert_eq!(limited.body.as_array().map(Vec::len), Some(1));

    let anonymous = app
        .request("GET", "/api/v1/auth/activity", None, None)
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_with_only_refresh_token_ends_session() {
    let app = TestApp::new().await;
    app.create_user("late@x.com", ORG_USER, UserStatus::Active)
        .await;
    let body_login = app.login_ok("late@x.com").await;
    let cookie_login = app.login_ok("late@x.com").await;

    // The access token has lapsed; only the refresh token is presented.
    let response = app
        .request(
            "POST",
            "/api/v1/auth/logout",
            Some(json!({ "refreshToken": body_login["refreshToken"] })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let cookie_refresh = cookie_login["refreshToken"].as_str().unwrap();
    let response = app
        .request_with_cookie(
            "POST",
            "/api/v1/auth/logout",
            None,
            &format!("refreshToken={cookie_refresh}"),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.cookie("refreshToken").is_some());

    for refresh in [&body_login["refreshToken"], &cookie_login["refreshToken"]] {
        let refreshed = app
            .request(
                "POST",
                "/api/v1/auth/refresh",
                Some(json!({ "refreshToken": refresh })),
                None,
            )
            .await;
        assert_eq!(refreshed.status, StatusCode::UNAUTHORIZED);
    }
    assert_eq!(app.state.sessions.count().await.unwrap(), 0);
}
