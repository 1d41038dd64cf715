//! API router with Swagger UI
//!
//! Layer order, outermost first: request id, trace, HTTP metrics, access
//! gate, panic catcher, CORS, then the route's own bearer/admin guards.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::error::PolicyDeniedBody;
use super::common::{ApiResponse, MessageResponse};
use super::middleware::{access_gate_middleware, admin_middleware, auth_middleware, AuthState, GateState};
use super::modules::metrics::{http_metrics_middleware, MetricsState};
use super::modules::request_id::request_id_middleware;
use super::modules::{auth, health, logs, metrics, security, sessions, users};
use crate::application::AccessServices;

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
                        .description(Some("Access token from POST /login"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        metrics::prometheus_metrics,
        auth::login,
        auth::verify,
        auth::logout,
        auth::token_status,
        sessions::list_sessions,
        sessions::force_logout,
        sessions::logout_all,
        sessions::cleanup,
        security::list_allowed_ips,
        security::add_allowed_ip,
        security::remove_allowed_ip,
        security::list_blocked_ips,
        security::block_ip,
        security::unblock_ip,
        security::security_stats,
        users::create_user,
        users::list_users,
        users::delete_user,
        users::update_user_tag,
        users::update_user_admin,
        users::bulk_users,
        logs::list_logs,
    ),
    components(schemas(
        MessageResponse,
        PolicyDeniedBody,
        health::HealthResponse,
        health::ComponentHealth,
        auth::LoginRequest,
        auth::LoginResponse,
        auth::LoginUser,
        auth::TokenRequest,
        auth::VerifyResponse,
        auth::TokenStatusResponse,
        sessions::SessionDto,
        sessions::SessionsResponse,
        sessions::ForceLogoutResponse,
        sessions::LogoutAllResponse,
        sessions::CleanupResponse,
        security::AllowedIpDto,
        security::AllowedIpsResponse,
        security::CreateAllowedIpRequest,
        security::BlockedIpDto,
        security::BlockedIpsResponse,
        security::CreateBlockedIpRequest,
        security::SecurityStatsResponse,
        security::CountryCountDto,
        security::IpCountDto,
        users::UserDto,
        users::CreateUserRequest,
        users::UpdateTagRequest,
        users::UpdateAdminRequest,
        users::BulkUserRequest,
        users::BulkUserResponse,
        logs::LogEntryDto,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness, database health and Prometheus metrics"),
        (name = "Authentication", description = "Login, token verification, logout and token status"),
        (name = "Sessions", description = "Active session view, forced logout and stale-session cleanup"),
        (name = "Security", description = "IP allow-list, block-list and login statistics"),
        (name = "Users", description = "User administration"),
        (name = "Logs", description = "System audit log"),
    ),
    info(
        title = "NTS Access Server API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Token authentication, session lifecycle and IP access control"
    )
)]
pub struct ApiDoc;

async fn route_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ApiResponse::<()>::error("Route not found")))
}

/// Build the full HTTP application.
///
/// `/metrics` is only mounted when a Prometheus recorder handle is given.
pub fn create_api_router(
    services: AccessServices,
    db: DatabaseConnection,
    metrics_handle: Option<PrometheusHandle>,
    trust_proxy_headers: bool,
) -> Router {
    let gate_state = GateState {
        gate: services.gate.clone(),
        audit: services.audit.clone(),
        trust_proxy_headers,
    };
    let auth_state = AuthState {
        lifecycle: services.lifecycle.clone(),
        guard: services.guard.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public, still behind the access gate
    let public_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/verify", post(auth::verify))
        .route("/logout-user", post(auth::logout))
        .with_state(services.clone());

    let protected_routes = Router::new()
        .route("/token-status", get(auth::token_status))
        .route_layer(middleware::from_fn_with_state(auth_state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/logout-all", post(sessions::logout_all))
        .route("/sessions/cleanup", post(sessions::cleanup))
        .route("/sessions/logout/{username}", post(sessions::force_logout))
        .route(
            "/security/allowed-ips",
            get(security::list_allowed_ips).post(security::add_allowed_ip),
        )
        .route("/security/allowed-ips/{id}", delete(security::remove_allowed_ip))
        .route(
            "/security/blocked-ips",
            get(security::list_blocked_ips).post(security::block_ip),
        )
        .route("/security/blocked-ips/{id}", delete(security::unblock_ip))
        .route("/security/stats", get(security::security_stats))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/bulk", post(users::bulk_users))
        .route("/users/{username}", delete(users::delete_user))
        .route("/users/{username}/tag", put(users::update_user_tag))
        .route("/users/{username}/admin", put(users::update_user_admin))
        .route("/logs", get(logs::list_logs))
        .route_layer(middleware::from_fn_with_state(auth_state.clone(), admin_middleware))
        .route_layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .with_state(services);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health::HealthState {
            db,
            started_at: Arc::new(Instant::now()),
        });

    let mut router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .merge(health_routes);

    if let Some(handle) = metrics_handle {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics::prometheus_metrics))
                .with_state(MetricsState { handle }),
        );
    }

    router
        .fallback(route_not_found)
        .layer(cors)
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn_with_state(gate_state, access_gate_middleware))
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}
