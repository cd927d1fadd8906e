mod common;

use axum::http::StatusCode;
use common::{Credential, TestApp, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_register_and_login() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/v1/auth/register",
            Credential::Anonymous,
            json!({ "email": "alice@example.com", "password": "secret123" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["email"], "alice@example.com");
    assert!(response.body.get("password_hash").is_none());
    let user_id = common::id(&response.body["id"]);

    let response = app
        .post(
            "/api/v1/auth/login",
            Credential::Anonymous,
            json!({ "email": "alice@example.com", "password": "secret123" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["token_type"], "Bearer");
    assert_eq!(response.body["expires_in"], 86_400);

    let token = response.body["token"].as_str().unwrap();
    assert_eq!(app.state.tokens.verify(token).unwrap(), user_id);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new();
    app.register("alice@example.com", PASSWORD).await;

    let response = app
        .post(
            "/api/v1/auth/register",
            Credential::Anonymous,
            json!({ "email": "alice@example.com", "password": "another-secret" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_registration_validation() {
    let app = TestApp::new();

    let bad_email = app
        .post(
            "/api/v1/auth/register",
            Credential::Anonymous,
            json!({ "email": "not-an-email", "password": "secret123" }),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::UNPROCESSABLE_ENTITY);

    let short_password = app
        .post(
            "/api/v1/auth/register",
            Credential::Anonymous,
            json!({ "email": "alice@example.com", "password": "short" }),
        )
        .await;
    assert_eq!(short_password.status, StatusCode::UNPROCESSABLE_ENTITY);

    let malformed = app
        .post(
            "/api/v1/auth/register",
            Credential::Anonymous,
            json!({ "email": "alice@example.com" }),
        )
        .await;
    assert!(malformed.status.is_client_error());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.register("alice@example.com", PASSWORD).await;

    let wrong_password = app
        .post(
            "/api/v1/auth/login",
            Credential::Anonymous,
            json!({ "email": "alice@example.com", "password": "secret124" }),
        )
        .await;
    let unknown_email = app
        .post(
            "/api/v1/auth/login",
            Credential::Anonymous,
            json!({ "email": "mallory@example.com", "password": "secret123" }),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);

    let empty = app
        .post(
            "/api/v1/auth/login",
            Credential::Anonymous,
            json!({ "email": "", "password": "" }),
        )
        .await;
    assert_eq!(empty.status, StatusCode::UNPROCESSABLE_ENTITY);
}

/// Register, log in, get refused by a home you are not in, get invited,
/// then get through with the invited role.
#[tokio::test]
async fn test_non_member_is_forbidden_until_invited() {
    let app = TestApp::new();

    let alice_id = app.register("alice@example.com", "secret123").await;
    let alice = app.login("alice@example.com", "secret123").await;

    let (_, owner) = app.user("owner@example.com").await;
    let home_id = app.create_home(&owner, "Lake house").await;
    let access_uri = format!("/api/v1/homes/{}/access", home_id);

    let response = app.get(&access_uri, Credential::Bearer(&alice)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .post(
            &format!("/api/v1/homes/{}/users/invite", home_id),
            Credential::Bearer(&owner),
            json!({ "user_id": alice_id, "role": "member" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = app.get(&access_uri, Credential::Bearer(&alice)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["role"], "member");
    assert_eq!(response.body["user_id"], alice_id.to_string());
    assert_eq!(response.body["scheme"], "bearer_token");

    let response = app
        .get(&format!("/api/v1/homes/{}", home_id), Credential::Bearer(&alice))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], "Lake house");
}

#[tokio::test]
async fn test_creator_sees_owner_role() {
    let app = TestApp::new();
    let (user_id, token) = app.user("alice@example.com").await;

    let response = app
        .post("/api/v1/homes", Credential::Bearer(&token), json!({ "name": "Flat" }))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["role"], "owner");
    let home_id = common::id(&response.body["id"]);

    let response = app
        .get(&format!("/api/v1/homes/{}/access", home_id), Credential::Bearer(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["role"], "owner");
    assert_eq!(response.body["user_id"], user_id.to_string());
}
