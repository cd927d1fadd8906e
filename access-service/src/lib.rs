pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, RequestId,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::AccessConfig;
use crate::middleware::{auth_middleware, membership_middleware, API_KEY_HEADER};
use crate::services::{ApiKeyService, AuthService, HomeService, LocationService, Store, TokenService};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::api_keys::list_api_keys,
        handlers::api_keys::create_api_key,
        handlers::api_keys::revoke_api_key,
        handlers::homes::create_home,
        handlers::homes::list_homes,
        handlers::homes::get_home,
        handlers::homes::update_home,
        handlers::homes::delete_home,
        handlers::homes::get_access,
        handlers::homes::list_members,
        handlers::homes::invite_member,
        handlers::homes::update_member_role,
        handlers::homes::remove_member,
        handlers::locations::list_locations,
        handlers::locations::create_location,
        handlers::locations::delete_location,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::RegisterResponse,
            dtos::auth::LoginRequest,
            dtos::auth::TokenResponse,
            dtos::api_key::CreateApiKeyRequest,
            dtos::api_key::CreateApiKeyResponse,
            dtos::api_key::ApiKeyResponse,
            dtos::home::HomeRequest,
            dtos::home::HomeSummary,
            dtos::home::CreateHomeResponse,
            dtos::home::InviteMemberRequest,
            dtos::home::UpdateMemberRoleRequest,
            dtos::home::AccessResponse,
            dtos::location::CreateLocationRequest,
            models::Home,
            models::HomeMember,
            models::HomeRole,
            models::Location,
            models::User,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration and password login"),
        (name = "API Keys", description = "Long-lived credentials for scripts and devices"),
        (name = "Homes", description = "Homes and the caller's access to them"),
        (name = "Members", description = "Home membership management"),
        (name = "Locations", description = "Location hierarchy within a home"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AccessConfig,
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub api_keys: ApiKeyService,
    pub auth_service: AuthService,
    pub homes: HomeService,
    pub locations: LocationService,
}

impl AppState {
    /// Wire every service against one store.
    pub fn new(config: AccessConfig, store: Arc<dyn Store>) -> Result<Self, AppError> {
        let tokens = TokenService::new(&config.jwt)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid JWT settings: {}", e)))?;
        Ok(Self {
            api_keys: ApiKeyService::new(store.clone()),
            auth_service: AuthService::new(store.clone(), tokens.clone()),
            homes: HomeService::new(store.clone()),
            locations: LocationService::new(store.clone()),
            tokens,
            store,
            config,
        })
    }
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let public_routes = Router::new()
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login));

    // Authenticated, not scoped to a home
    let identity_routes = Router::new()
        .route(
            "/api/v1/api-keys",
            get(handlers::api_keys::list_api_keys).post(handlers::api_keys::create_api_key),
        )
        .route(
            "/api/v1/api-keys/:api_key_id",
            delete(handlers::api_keys::revoke_api_key),
        )
        .route(
            "/api/v1/homes",
            get(handlers::homes::list_homes).post(handlers::homes::create_home),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    // Authenticated and scoped to `:home_id`. The layer added last runs first,
    // so identity is resolved before membership is checked.
    let home_routes = Router::new()
        .route(
            "/api/v1/homes/:home_id",
            get(handlers::homes::get_home)
                .put(handlers::homes::update_home)
                .delete(handlers::homes::delete_home),
        )
        .route("/api/v1/homes/:home_id/access", get(handlers::homes::get_access))
        .route("/api/v1/homes/:home_id/users", get(handlers::homes::list_members))
        .route(
            "/api/v1/homes/:home_id/users/invite",
            post(handlers::homes::invite_member),
        )
        .route(
            "/api/v1/homes/:home_id/users/:user_id",
            put(handlers::homes::update_member_role).delete(handlers::homes::remove_member),
        )
        .route(
            "/api/v1/homes/:home_id/locations",
            get(handlers::locations::list_locations).post(handlers::locations::create_location),
        )
        .route(
            "/api/v1/homes/:home_id/locations/:location_id",
            delete(handlers::locations::delete_location),
        )
        .route_layer(from_fn_with_state(state.clone(), membership_middleware))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let cors = cors_layer(&state.config.security.allowed_origins)?;

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/.well-known/openapi.json", get(openapi))
        .merge(public_routes)
        .merge(identity_routes)
        .merge(home_routes)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let request_id = request
                    .extensions()
                    .get::<RequestId>()
                    .map(|id| id.0.as_str())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .layer(from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, AppError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
        ]);

    // Only reachable in dev; prod configuration rejects the wildcard.
    if allowed_origins.iter().any(|origin| origin == "*") {
        return Ok(layer.allow_origin(AllowOrigin::any()));
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", origin, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(layer.allow_origin(origins))
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Liveness plus a store round trip
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Store unreachable", body = dtos::ErrorResponse)
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state
        .store
        .health_check()
        .await
        .map_err(|e| AppError::from(services::ServiceError::from(e)))?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
    })))
}
