//! Integration tests for the invitation lifecycle.

mod helpers;

use http::StatusCode;
use serde_json::{Value, json};

use helpers::{ORG_ADMIN, ORG_USER, TestApp, TestResponse};
use remit_entity::user::UserStatus;

const NEW_PASSWORD: &str = "Copper-Harbor-83$";

async fn invite(app: &TestApp, token: &str, email: &str) -> TestResponse {
    app.request(
        "POST",
        "/api/v1/invitations",
        Some(json!({ "email": email, "roleId": ORG_USER, "message": "Welcome aboard" })),
        Some(token),
    )
    .await
}

async fn accept(app: &TestApp, invite_token: &str) -> TestResponse {
    app.request(
        "POST",
        "/api/v1/invitations/accept",
        Some(accept_body(invite_token)),
        None,
    )
    .await
}

fn accept_body(invite_token: &str) -> Value {
    json!({
        "token": invite_token,
        "firstName": "Ada",
        "lastName": "Mensah",
        "password": NEW_PASSWORD,
        "department": "Treasury",
    })
}

fn token_of(response: &TestResponse) -> String {
    response.body["token"].as_str().expect("invite token").to_string()
}

#[tokio::test]
async fn test_full_invitation_flow() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let created = invite(&app, &admin, "ada@x.com").await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    let token = token_of(&created);
    assert_eq!(token.len(), 64);
    assert!(
        created.body["inviteUrl"]
            .as_str()
            .unwrap()
            .ends_with(&format!("token={token}"))
    );

    let validated = app
        .request(
            "GET",
            &format!("/api/v1/invitations/validate?token={token}"),
            None,
            None,
        )
        .await;
    assert_eq!(validated.status, StatusCode::OK);
    assert_eq!(validated.body["valid"], true);
    assert_eq!(validated.body["email"], "ada@x.com");
    assert_eq!(validated.body["role"], "ORG_USER");
    assert_eq!(validated.body["message"], "Welcome aboard");

    let accepted = accept(&app, &token).await;
    assert_eq!(accepted.status, StatusCode::CREATED, "{:?}", accepted.body);
    assert_eq!(accepted.body["email"], "ada@x.com");
    assert_eq!(accepted.body["role"], "ORG_USER");

    let login = app.login("ada@x.com", NEW_PASSWORD).await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["user"]["department"], "Treasury");

    // Single use.
    let again = accept(&app, &token).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    let revalidated = app
        .request(
            "GET",
            &format!("/api/v1/invitations/validate?token={token}"),
            None,
            None,
        )
        .await;
    assert_eq!(revalidated.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_requires_permission() {
    let app = TestApp::new().await;
    app.create_user("clerk@x.com", ORG_USER, UserStatus::Active)
        .await;
    let body = app.login_ok("clerk@x.com").await;
    let clerk = body["accessToken"].as_str().unwrap();

    let forbidden = invite(&app, clerk, "someone@x.com").await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.error_code(), "FORBIDDEN");

    let anonymous = app
        .request(
            "POST",
            "/api/v1/invitations",
            Some(json!({ "email": "someone@x.com", "roleId": ORG_USER })),
            None,
        )
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let listing = app.request("GET", "/api/v1/invitations", None, Some(clerk)).await;
    assert_eq!(listing.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_rejects_existing_identity_and_duplicates() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    app.create_user("taken@x.com", ORG_USER, UserStatus::Active)
        .await;

    let existing = invite(&app, &admin, "taken@x.com").await;
    assert_eq!(existing.status, StatusCode::CONFLICT);

    assert_eq!(
        invite(&app, &admin, "fresh@x.com").await.status,
        StatusCode::CREATED
    );
    let duplicate = invite(&app, &admin, "fresh@x.com").await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let unknown_role = app
        .request(
            "POST",
            "/api/v1/invitations",
            Some(json!({ "email": "other@x.com", "roleId": 999 })),
            Some(&admin),
        )
        .await;
    assert_eq!(unknown_role.status, StatusCode::NOT_FOUND);

    let bad_email = app
        .request(
            "POST",
            "/api/v1/invitations",
            Some(json!({ "email": "nope", "roleId": ORG_USER })),
            Some(&admin),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expired_invitation() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let created = invite(&app, &admin, "late@x.com").await;
    let id = created.uuid("id");
    app.store
        .set_invitation_expiry(id, chrono::Utc::now() - chrono::Duration::minutes(1))
        .await;

    let response = accept(&app, &token_of(&created)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "EXPIRED");

    let listed = app
        .request(
            "GET",
            "/api/v1/invitations?status=EXPIRED",
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["total"], 1);
    assert_eq!(listed.body["invitations"][0]["status"], "EXPIRED");

    // An expired invitation no longer blocks a new one.
    assert_eq!(
        invite(&app, &admin, "late@x.com").await.status,
        StatusCode::CREATED
    );
}

#[tokio::test]
async fn test_unknown_token() {
    let app = TestApp::new().await;

    let response = accept(&app, &"0".repeat(64)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request(
            "GET",
            "/api/v1/invitations/validate?token=missing",
            None,
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_blocks_acceptance() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let created = invite(&app, &admin, "gone@x.com").await;
    let id = created.uuid("id");

    let cancelled = app
        .request(
            "DELETE",
            &format!("/api/v1/invitations/{id}"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["status"], "CANCELLED");

    let response = accept(&app, &token_of(&created)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let missing = app
        .request(
            "DELETE",
            &format!("/api/v1/invitations/{}", uuid::Uuid::new_v4()),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resend_replaces_token() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let created = invite(&app, &admin, "again@x.com").await;
    let id = created.uuid("id");
    let old_token = token_of(&created);

    let resent = app
        .request(
            "POST",
            &format!("/api/v1/invitations/{id}/resend"),
            Some(json!({ "expiresInHours": 48 })),
            Some(&admin),
        )
        .await;
    assert_eq!(resent.status, StatusCode::OK, "{:?}", resent.body);
    let new_token = token_of(&resent);
    assert_ne!(new_token, old_token);

    assert_eq!(
        accept(&app, &old_token).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        accept(&app, &new_token).await.status,
        StatusCode::CREATED
    );

    // Accepted invitations cannot be re-sent or cancelled.
    let resend_accepted = app
        .request(
            "POST",
            &format!("/api/v1/invitations/{id}/resend"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(resend_accepted.status, StatusCode::BAD_REQUEST);
    let cancel_accepted = app
        .request(
            "DELETE",
            &format!("/api/v1/invitations/{id}"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(cancel_accepted.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    invite(&app, &admin, "one@x.com").await;
    let second = invite(&app, &admin, "two@x.com").await;
    accept(&app, &token_of(&second)).await;

    let all = app
        .request("GET", "/api/v1/invitations", None, Some(&admin))
        .await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["total"], 2);

    let pending = app
        .request(
            "GET",
            "/api/v1/invitations?status=PENDING",
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(pending.body["total"], 1);
    assert_eq!(pending.body["invitations"][0]["email"], "one@x.com");

    let bad = app
        .request(
            "GET",
            "/api/v1/invitations?status=SIDEWAYS",
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_accept_promotes_pending_registration() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let registered = app
        .request(
            "POST",
            "/api/v1/auth/register",
            Some(json!({
                "email": "pending@x.com",
                "password": "Quartz-Willow-19#",
                "firstName": "Pending",
                "lastName": "Person",
            })),
            None,
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED);
    let user_id = registered.uuid("id");

    let created = app
        .request(
            "POST",
            "/api/v1/invitations",
            Some(json!({ "email": "pending@x.com", "roleId": ORG_ADMIN })),
            Some(&admin),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);

    let accepted = accept(&app, &token_of(&created)).await;
    assert_eq!(accepted.status, StatusCode::OK, "{:?}", accepted.body);
    assert_eq!(accepted.uuid("userId"), user_id);
    // The placeholder keeps the role it registered with.
    assert_eq!(accepted.body["role"], "ORG_USER");

    let login = app.login("pending@x.com", NEW_PASSWORD).await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["user"]["status"], "ACTIVE");
    assert_eq!(login.body["user"]["firstName"], "Ada");
}

#[tokio::test]
async fn test_accept_rejects_weak_password() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let created = invite(&app, &admin, "weak@x.com").await;

    let mut body = accept_body(&token_of(&created));
    body["password"] = json!("password");
    let response = app
        .request("POST", "/api/v1/invitations/accept", Some(body), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // The invitation is still usable.
    assert_eq!(
        accept(&app, &token_of(&created)).await.status,
        StatusCode::CREATED
    );
}
