//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup and login.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Json};
use educonnect_core::domain::{NewUser, Role};
use educonnect_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::token::issue_token;
use crate::web::extract::AppJson;
use crate::web::state::AppState;
use crate::web::users::UserResponse;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: String,
    /// Omitted for accounts created through a social provider.
    pub password: Option<String>,
    #[serde(rename = "photoURL", alias = "photoUrl", alias = "image")]
    pub photo_url: Option<String>,
    /// `student` (default) or `tutor`.
    pub role: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
    pub role: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

/// POST /signup - Create a user, or return the existing one with this email
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 200, description = "A user with this email already exists", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorBody)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    // 1. Validate
    let email = req.email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    let role = match req.role.as_deref() {
        None => Role::Student,
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
    };
    if role == Role::Admin {
        return Err(ApiError::BadRequest(
            "The admin role cannot be self-assigned".to_string(),
        ));
    }

    // 2. Hash the password, if any
    let hashed_password = match req.password.as_deref() {
        Some(password) if !password.is_empty() => Some(hash_password(password)?),
        _ => None,
    };

    // 3. Insert unless the email is taken
    let (user, created) = state
        .store
        .insert_user_if_absent(NewUser {
            name: req.name,
            email,
            photo_url: req.photo_url,
            role,
            hashed_password,
        })
        .await?;

    if created {
        info!(user_id = %user.id, role = %user.role, "User signed up");
        Ok((StatusCode::CREATED, Json(user.into())))
    } else {
        Ok((StatusCode::OK, Json(user.into())))
    }
}

/// POST /login - Exchange email and password for an access token
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    // 1. Get user by email
    let creds = match state.store.get_user_by_email(req.email.trim()).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(ApiError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    // 2. Verify password
    let stored = creds
        .hashed_password
        .as_deref()
        .ok_or(ApiError::InvalidCredentials)?;
    let parsed_hash = PasswordHash::new(stored).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    // 3. Issue the token
    let user = creds.user;
    let token = issue_token(
        &user.email,
        user.role,
        &state.config.jwt_secret,
        state.config.token_ttl,
    )
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        token,
        email: user.email,
        role: user.role.as_str().to_string(),
    }))
}
