//! services/api/src/web/middleware.rs
//!
//! Authentication and role middleware for protecting route groups.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use educonnect_core::domain::Role;
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::token::{verify_token, Claims};
use crate::web::state::AppState;

/// Middleware that validates the bearer token and extracts its claims.
///
/// If valid, inserts the `Claims` into request extensions for handlers to use.
/// A missing token is 401; a token that fails verification is 403.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the bearer token
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    // 2. Verify signature and expiry
    let claims = verify_token(token, &state.config.jwt_secret).map_err(|e| {
        warn!("Rejected access token: {}", e);
        ApiError::Forbidden
    })?;

    // 3. Insert claims into request extensions
    req.extensions_mut().insert(claims);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}

/// Admits admins only. Must run inside `require_auth`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    require_role(req, next, &[Role::Admin]).await
}

/// Admits tutors and admins. Must run inside `require_auth`.
pub async fn require_tutor(req: Request, next: Next) -> Result<Response, ApiError> {
    require_role(req, next, &[Role::Tutor, Role::Admin]).await
}

async fn require_role(req: Request, next: Next, allowed: &[Role]) -> Result<Response, ApiError> {
    let role = req
        .extensions()
        .get::<Claims>()
        .map(Claims::role)
        .ok_or(ApiError::Unauthorized)?;

    if !allowed.contains(&role) {
        warn!(%role, path = %req.uri().path(), "Role not permitted");
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(req).await)
}
