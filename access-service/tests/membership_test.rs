mod common;

use axum::http::StatusCode;
use common::{Credential, TestApp};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_every_home_route_requires_membership() {
    let app = TestApp::new();
    let (_, owner) = app.user("owner@example.com").await;
    let (stranger_id, stranger) = app.user("stranger@example.com").await;
    let home_id = app.create_home(&owner, "Flat").await;
    let base = format!("/api/v1/homes/{}", home_id);

    let cases = [
        app.get(&base, Credential::Bearer(&stranger)).await,
        app.put(&base, Credential::Bearer(&stranger), json!({ "name": "Mine" })).await,
        app.delete(&base, Credential::Bearer(&stranger)).await,
        app.get(&format!("{}/users", base), Credential::Bearer(&stranger)).await,
        app.post(
            &format!("{}/users/invite", base),
            Credential::Bearer(&stranger),
            json!({ "user_id": stranger_id, "role": "owner" }),
        )
        .await,
        app.get(&format!("{}/locations", base), Credential::Bearer(&stranger)).await,
    ];

    for response in cases {
        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }

    // The home survived the attempts above
    let response = app.get(&base, Credential::Bearer(&owner)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], "Flat");
}

#[tokio::test]
async fn test_unauthenticated_beats_forbidden() {
    let app = TestApp::new();
    let (_, owner) = app.user("owner@example.com").await;
    let home_id = app.create_home(&owner, "Flat").await;

    let response = app
        .get(&format!("/api/v1/homes/{}", home_id), Credential::Anonymous)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_and_malformed_home_ids() {
    let app = TestApp::new();
    let (_, token) = app.user("alice@example.com").await;

    let response = app
        .get(&format!("/api/v1/homes/{}", Uuid::new_v4()), Credential::Bearer(&token))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get("/api/v1/homes/kitchen", Credential::Bearer(&token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_invite_is_rejected() {
    let app = TestApp::new();
    let (_, owner) = app.user("owner@example.com").await;
    let (bob_id, _) = app.user("bob@example.com").await;
    let home_id = app.create_home(&owner, "Flat").await;
    let invite_uri = format!("/api/v1/homes/{}/users/invite", home_id);

    let first = app
        .post(&invite_uri, Credential::Bearer(&owner), json!({ "user_id": bob_id, "role": "viewer" }))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["role"], "viewer");

    let second = app
        .post(&invite_uri, Credential::Bearer(&owner), json!({ "user_id": bob_id, "role": "admin" }))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);

    let members = app
        .get(&format!("/api/v1/homes/{}/users", home_id), Credential::Bearer(&owner))
        .await;
    let members = members.body.as_array().unwrap();
    assert_eq!(members.len(), 2);
    let bob: Vec<_> = members
        .iter()
        .filter(|m| m["user_id"] == bob_id.to_string())
        .collect();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0]["role"], "viewer");
}

#[tokio::test]
async fn test_invite_validation() {
    let app = TestApp::new();
    let (_, owner) = app.user("owner@example.com").await;
    let home_id = app.create_home(&owner, "Flat").await;
    let invite_uri = format!("/api/v1/homes/{}/users/invite", home_id);

    let unknown_user = app
        .post(
            &invite_uri,
            Credential::Bearer(&owner),
            json!({ "user_id": Uuid::new_v4(), "role": "member" }),
        )
        .await;
    assert_eq!(unknown_user.status, StatusCode::NOT_FOUND);

    let (bob_id, _) = app.user("bob@example.com").await;
    let unknown_role = app
        .post(
            &invite_uri,
            Credential::Bearer(&owner),
            json!({ "user_id": bob_id, "role": "superuser" }),
        )
        .await;
    assert!(unknown_role.status.is_client_error());
}

#[tokio::test]
async fn test_membership_is_checked_on_every_request() {
    let app = TestApp::new();
    let (_, owner) = app.user("owner@example.com").await;
    let (bob_id, bob) = app.user("bob@example.com").await;
    let home_id = app.create_home(&owner, "Flat").await;
    let access_uri = format!("/api/v1/homes/{}/access", home_id);
    let member_uri = format!("/api/v1/homes/{}/users/{}", home_id, bob_id);

    app.post(
        &format!("/api/v1/homes/{}/users/invite", home_id),
        Credential::Bearer(&owner),
        json!({ "user_id": bob_id, "role": "viewer" }),
    )
    .await;
    assert_eq!(app.get(&access_uri, Credential::Bearer(&bob)).await.body["role"], "viewer");

    let response = app
        .put(&member_uri, Credential::Bearer(&owner), json!({ "role": "admin" }))
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&access_uri, Credential::Bearer(&bob)).await.body["role"], "admin");

    let response = app.delete(&member_uri, Credential::Bearer(&owner)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(
        app.get(&access_uri, Credential::Bearer(&bob)).await.status,
        StatusCode::FORBIDDEN
    );

    let response = app.delete(&member_uri, Credential::Bearer(&owner)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_homes_only_shows_memberships() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice@example.com").await;
    let (_, bob) = app.user("bob@example.com").await;
    app.create_home(&alice, "Alice's flat").await;
    app.create_home(&bob, "Bob's cabin").await;

    let response = app.get("/api/v1/homes", Credential::Bearer(&alice)).await;
    let homes = response.body.as_array().unwrap();
    assert_eq!(homes.len(), 1);
    assert_eq!(homes[0]["name"], "Alice's flat");
}

#[tokio::test]
async fn test_concurrent_home_creation_each_has_one_owner() {
    let app = std::sync::Arc::new(TestApp::new());
    let (user_id, token) = app.user("alice@example.com").await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            let token = token.clone();
            tokio::spawn(async move { app.create_home(&token, "Same name").await })
        })
        .collect();

    for handle in handles {
        let home_id = handle.await.unwrap();
        let members = app
            .get(&format!("/api/v1/homes/{}/users", home_id), Credential::Bearer(&token))
            .await;
        let members = members.body.as_array().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["user_id"], user_id.to_string());
        assert_eq!(members[0]["role"], "owner");
    }
}

#[tokio::test]
async fn test_rename_and_delete_home() {
    let app = TestApp::new();
    let (_, owner) = app.user("owner@example.com").await;
    let home_id = app.create_home(&owner, "Flat").await;
    let uri = format!("/api/v1/homes/{}", home_id);

    let response = app.put(&uri, Credential::Bearer(&owner), json!({ "name": "Loft" })).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], "Loft");

    let response = app.delete(&uri, Credential::Bearer(&owner)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    // The owner edge went with the home
    let response = app.get(&uri, Credential::Bearer(&owner)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}
