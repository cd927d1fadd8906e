//! Shared setup for access-service integration tests.
//!
//! Each test gets its own router over a fresh `MemoryStore` and its own
//! signing secret.

#![allow(dead_code)]

use access_service::{
    build_router,
    config::AccessConfig,
    models::{ApiKey, Home, HomeMember, HomeRole, Item, Location, User},
    services::{MemoryStore, Store, StoreError},
    AppState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "secret123";

/// How a test request authenticates.
#[derive(Clone, Copy)]
pub enum Credential<'a> {
    Anonymous,
    Bearer(&'a str),
    ApiKey(&'a str),
    Both { token: &'a str, key: &'a str },
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub struct TestApp<S = MemoryStore> {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<S>,
}

pub fn test_config() -> AccessConfig {
    let secret = format!("test-signing-secret-{}", Uuid::new_v4());
    let common = service_core::config::Config {
        port: 8080,
        shutdown_grace_seconds: 1,
    };
    AccessConfig::from_lookup(common, move |key| match key {
        "DATABASE_URL" => Some("postgres://localhost/mnemo_test".to_string()),
        "JWT_SECRET" => Some(secret.clone()),
        "LOG_LEVEL" => Some("error".to_string()),
        _ => None,
    })
    .expect("test config")
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl<S: Store + 'static> TestApp<S> {
    pub fn with_store(store: S) -> Self {
        let store = Arc::new(store);
        let state = AppState::new(test_config(), store.clone()).expect("state");
        let router = build_router(state.clone()).expect("router");
        Self {
            router,
            state,
            store,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        credential: Credential<'_>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        builder = match credential {
            Credential::Anonymous => builder,
            Credential::Bearer(token) => {
                builder.header("Authorization", format!("Bearer {}", token))
            }
            Credential::ApiKey(key) => builder.header("X-API-Key", key),
            Credential::Both { token, key } => builder
                .header("Authorization", format!("Bearer {}", token))
                .header("X-API-Key", key),
        };

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, credential: Credential<'_>) -> TestResponse {
        self.request(Method::GET, uri, credential, None).await
    }

    pub async fn post(&self, uri: &str, credential: Credential<'_>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, credential, Some(body)).await
    }

    pub async fn put(&self, uri: &str, credential: Credential<'_>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, credential, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, credential: Credential<'_>) -> TestResponse {
        self.request(Method::DELETE, uri, credential, None).await
    }

    pub async fn register(&self, email: &str, password: &str) -> Uuid {
        let response = self
            .post(
                "/api/v1/auth/register",
                Credential::Anonymous,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        id(&response.body["id"])
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/v1/auth/login",
                Credential::Anonymous,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["token"].as_str().unwrap().to_string()
    }

    /// Register and log in, returning the user id and a bearer token.
    pub async fn user(&self, email: &str) -> (Uuid, String) {
        let user_id = self.register(email, PASSWORD).await;
        let token = self.login(email, PASSWORD).await;
        (user_id, token)
    }

    pub async fn create_home(&self, token: &str, name: &str) -> Uuid {
        let response = self
            .post("/api/v1/homes", Credential::Bearer(token), json!({ "name": name }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        id(&response.body["id"])
    }

    /// Returns the key id and the raw key.
    pub async fn create_api_key(&self, token: &str, name: &str) -> (Uuid, String) {
        let response = self
            .post("/api/v1/api-keys", Credential::Bearer(token), json!({ "name": name }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        (
            id(&response.body["id"]),
            response.body["key"].as_str().unwrap().to_string(),
        )
    }
}

pub fn id(value: &Value) -> Uuid {
    Uuid::parse_str(value.as_str().expect("id is a string")).expect("id is a uuid")
}

/// A store whose backend is down: every operation fails.
pub struct FailingStore;

fn unavailable<T>() -> Result<T, StoreError> {
    Err(StoreError::Backend(anyhow::anyhow!("connection refused")))
}

#[async_trait]
impl Store for FailingStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        unavailable()
    }
    async fn find_user_by_email(&self, _: &str) -> Result<Option<User>, StoreError> {
        unavailable()
    }
    async fn find_user_by_id(&self, _: Uuid) -> Result<Option<User>, StoreError> {
        unavailable()
    }
    async fn insert_user(&self, _: &User) -> Result<(), StoreError> {
        unavailable()
    }
    async fn insert_api_key(&self, _: &ApiKey) -> Result<(), StoreError> {
        unavailable()
    }
    async fn list_active_api_keys(&self) -> Result<Vec<ApiKey>, StoreError> {
        unavailable()
    }
    async fn list_api_keys(&self, _: Uuid) -> Result<Vec<ApiKey>, StoreError> {
        unavailable()
    }
    async fn set_api_key_inactive(&self, _: Uuid, _: Uuid) -> Result<u64, StoreError> {
        unavailable()
    }
    async fn create_home_with_owner(&self, _: &Home) -> Result<HomeMember, StoreError> {
        unavailable()
    }
    async fn list_homes_for_user(&self, _: Uuid) -> Result<Vec<Home>, StoreError> {
        unavailable()
    }
    async fn find_home(&self, _: Uuid) -> Result<Option<Home>, StoreError> {
        unavailable()
    }
    async fn update_home(
        &self,
        _: Uuid,
        _: &str,
        _: DateTime<Utc>,
    ) -> Result<Option<Home>, StoreError> {
        unavailable()
    }
    async fn delete_home(&self, _: Uuid) -> Result<u64, StoreError> {
        unavailable()
    }
    async fn find_membership(&self, _: Uuid, _: Uuid) -> Result<Option<HomeRole>, StoreError> {
        unavailable()
    }
    async fn insert_membership(&self, _: &HomeMember) -> Result<(), StoreError> {
        unavailable()
    }
    async fn list_members(&self, _: Uuid) -> Result<Vec<HomeMember>, StoreError> {
        unavailable()
    }
    async fn update_member_role(&self, _: Uuid, _: Uuid, _: HomeRole) -> Result<u64, StoreError> {
        unavailable()
    }
    async fn remove_member(&self, _: Uuid, _: Uuid) -> Result<u64, StoreError> {
        unavailable()
    }
    async fn insert_location(&self, _: &Location) -> Result<(), StoreError> {
        unavailable()
    }
    async fn find_location(&self, _: Uuid, _: Uuid) -> Result<Option<Location>, StoreError> {
        unavailable()
    }
    async fn list_locations(&self, _: Uuid) -> Result<Vec<Location>, StoreError> {
        unavailable()
    }
    async fn count_child_locations(&self, _: Uuid) -> Result<i64, StoreError> {
        unavailable()
    }
    async fn count_items_in_location(&self, _: Uuid) -> Result<i64, StoreError> {
        unavailable()
    }
    async fn delete_location(&self, _: Uuid, _: Uuid) -> Result<u64, StoreError> {
        unavailable()
    }
    async fn insert_item(&self, _: &Item) -> Result<(), StoreError> {
        unavailable()
    }
}
