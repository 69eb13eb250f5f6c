//! services/api/src/web/users.rs
//!
//! User listing, role flags for the dashboards, and role administration.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use educonnect_core::domain::{Role, User};
use educonnect_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::token::Claims;
use crate::web::extract::{AppJson, AppPath, AppQuery};
use crate::web::rest::UpdateResult;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// A user as exposed over the API. Never carries the password hash.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            photo_url: user.photo_url,
            role: user.role.as_str().to_string(),
            created_at: user.created_at,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserSearchQuery {
    /// Case-insensitive substring of the name or email.
    pub search: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IsAdminResponse {
    pub is_admin: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IsTutorResponse {
    pub is_tutor: bool,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Lists every tutor, for the public home page.
#[utoipa::path(
    get,
    path = "/information",
    responses((status = 200, description = "All tutors", body = Vec<UserResponse>))
)]
pub async fn information_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let tutors = state.store.list_users_by_role(Role::Tutor).await?;
    Ok(Json(tutors.into_iter().map(UserResponse::from).collect()))
}

/// Looks up the role of `email`, on behalf of the caller in `claims`.
/// Callers may only ask about themselves unless they are admins.
async fn role_of(state: &AppState, claims: &Claims, email: &str) -> ApiResult<Option<Role>> {
    if !claims.may_act_for(email) {
        return Err(ApiError::Forbidden);
    }
    match state.store.get_user_by_email(email).await {
        Ok(creds) => Ok(Some(creds.user.role)),
        Err(PortError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    get,
    path = "/users/admin/{email}",
    params(("email" = String, Path, description = "Email of the user to check")),
    responses(
        (status = 200, body = IsAdminResponse),
        (status = 403, description = "Asking about another user", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn is_admin_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppPath(email): AppPath<String>,
) -> ApiResult<Json<IsAdminResponse>> {
    let role = role_of(&state, &claims, &email).await?;
    Ok(Json(IsAdminResponse {
        is_admin: role == Some(Role::Admin),
    }))
}

#[utoipa::path(
    get,
    path = "/users/tutor/{email}",
    params(("email" = String, Path, description = "Email of the user to check")),
    responses(
        (status = 200, body = IsTutorResponse),
        (status = 403, description = "Asking about another user", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn is_tutor_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppPath(email): AppPath<String>,
) -> ApiResult<Json<IsTutorResponse>> {
    let role = role_of(&state, &claims, &email).await?;
    Ok(Json(IsTutorResponse {
        is_tutor: role == Some(Role::Tutor),
    }))
}

#[utoipa::path(
    get,
    path = "/users",
    params(UserSearchQuery),
    responses((status = 200, body = Vec<UserResponse>)),
    security(("bearer" = []))
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<UserSearchQuery>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let users = state.store.list_users(search).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, body = UpdateResult),
        (status = 400, description = "Unknown role", body = ErrorBody),
        (status = 404, description = "No such user", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_role_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateRoleRequest>,
) -> ApiResult<Json<UpdateResult>> {
    let role = req
        .role
        .parse::<Role>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if !state.store.update_user_role(user_id, role).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    info!(%user_id, %role, by = %claims.email, "User role updated");
    Ok(Json(UpdateResult::matched(1)))
}
