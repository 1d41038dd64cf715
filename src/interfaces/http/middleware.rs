//! Request middleware: access gate, bearer authentication, admin guard
//!
//! Order on every request: the access gate runs first and rejects denied
//! IPs before anything looks at the `Authorization` header. Protected
//! routes then add `auth_middleware`, and admin routes `admin_middleware`
//! on top of it.

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::application::{AccessGate, AuditTrail, AuthorizationGuard, ClientContext, SessionLifecycle};
use crate::shared::DomainError;

/// Header carrying the original client address behind a reverse proxy
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Client address used when the peer address is not available
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Clone)]
pub struct GateState {
    pub gate: AccessGate,
    pub audit: AuditTrail,
    pub trust_proxy_headers: bool,
}

#[derive(Clone)]
pub struct AuthState {
    pub lifecycle: SessionLifecycle,
    pub guard: AuthorizationGuard,
}

/// Caller identity attached by [`auth_middleware`]
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub username: String,
    pub token: String,
}

/// Resolve the caller's IP in canonical form.
///
/// The first `X-Forwarded-For` hop wins only when `trust_proxy_headers`
/// is set; otherwise the socket peer address is used.
pub fn resolve_client_ip(request: &Request<Body>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        let forwarded = request
            .headers()
            .get(FORWARDED_FOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|hop| hop.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip.to_canonical().to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_canonical().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Take the token out of a `Bearer <token>` header value.
pub fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Outermost policy check. Denied requests never reach authentication,
/// so a blocked caller cannot even refresh session activity.
pub async fn access_gate_middleware(
    State(state): State<GateState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let ip = resolve_client_ip(&request, state.trust_proxy_headers);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = match state.gate.admit(&ip).await {
        Ok(()) => {
            let user_agent = request
                .headers()
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("Unknown")
                .to_string();
            let mut client = ClientContext::new(ip.clone(), user_agent);
            client.geo = state.gate.known_location(&ip);
            request.extensions_mut().insert(client);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    };

    if response.status() == StatusCode::INTERNAL_SERVER_ERROR {
        state
            .audit
            .error(format!("Internal error on {} {}", method, path), None, Some(&ip))
            .await;
    }
    response
}

/// Bearer authentication: 401 without a token, 403 when it is invalid,
/// expired or revoked. Accepted requests refresh session activity.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_token)
        .map(String::from);
    let Some(token) = token else {
        return DomainError::Unauthenticated("Access token required".into()).into_response();
    };

    let claims = match state.lifecycle.authenticate(&token).await {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };
    state.lifecycle.record_activity(&token).await;

    request.extensions_mut().insert(AuthenticatedUser {
        username: claims.username,
        token,
    });
    next.run(request).await
}

/// Requires the authenticated caller to hold the admin role.
/// Must be layered inside [`auth_middleware`].
pub async fn admin_middleware(
    State(state): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(user) = request.extensions().get::<AuthenticatedUser>() else {
        return DomainError::Unauthenticated("Access token required".into()).into_response();
    };
    if let Err(e) = state.guard.require_admin(&user.username).await {
        return e.into_response();
    }
    next.run(request).await
}
