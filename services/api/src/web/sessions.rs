//! services/api/src/web/sessions.rs
//!
//! Study-session endpoints: creation, paginated listing, and the lifecycle
//! transitions driven from the admin and tutor dashboards.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use educonnect_core::domain::{NewSession, RegistrationFee, Session};
use educonnect_core::lifecycle::TransitionOutcome;
use educonnect_core::pagination::{Page, PageRequest};
use educonnect_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::token::Claims;
use crate::web::extract::{AppJson, AppPath, AppQuery};
use crate::web::rest::{CreatedResponse, DeleteResult};
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub tutor_name: String,
    pub tutor_email: String,
    pub description: String,
    pub registration_start_date: String,
    pub registration_end_date: String,
    pub class_start_date: String,
    pub class_end_date: String,
    pub duration: String,
    pub image: Option<String>,
    /// `pending`, `approved` or `rejected`.
    pub status: String,
    pub registration_fee: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(s: Session) -> Self {
        Self {
            id: s.id,
            title: s.title,
            tutor_name: s.tutor_name,
            tutor_email: s.tutor_email,
            description: s.description,
            registration_start_date: s.registration_start_date,
            registration_end_date: s.registration_end_date,
            class_start_date: s.class_start_date,
            class_end_date: s.class_end_date,
            duration: s.duration,
            image: s.image,
            status: s.status.as_str().to_string(),
            registration_fee: s.registration_fee.amount(),
            created_at: s.created_at,
        }
    }
}

/// The tutor-supplied fields of a new session. Status and fee are never
/// taken from the request.
#[derive(Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSessionRequest {
    pub title: String,
    pub tutor_name: String,
    /// Defaults to the caller's email.
    pub tutor_email: String,
    pub description: String,
    pub registration_start_date: String,
    pub registration_end_date: String,
    pub class_start_date: String,
    pub class_end_date: String,
    pub duration: String,
    pub image: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number. Defaults to 1.
    pub page: Option<i64>,
    /// Page size. Defaults to 6, at most 100.
    pub limit: Option<i64>,
}

impl PageQuery {
    fn to_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionPageResponse {
    pub sessions: Vec<SessionResponse>,
    pub total_sessions: u64,
    pub current_page: u64,
    pub total_pages: u64,
}

impl From<Page<Session>> for SessionPageResponse {
    fn from(page: Page<Session>) -> Self {
        let page = page.map(SessionResponse::from);
        Self {
            total_sessions: page.total,
            current_page: page.current_page(),
            total_pages: page.total_pages(),
            sessions: page.items,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetailsResponse {
    pub session_details: SessionResponse,
}

/// Result of every lifecycle operation. `applied` is false when the session
/// was not in the state the transition requires; nothing was changed then.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub applied: bool,
    pub current_status: String,
    pub session: SessionResponse,
}

impl From<TransitionOutcome> for TransitionResponse {
    fn from(outcome: TransitionOutcome) -> Self {
        Self {
            applied: outcome.applied,
            current_status: outcome.current_status().as_str().to_string(),
            session: outcome.session.into(),
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuery {
    /// Registration fee in major currency units.
    pub add_fee: Option<String>,
}

//=========================================================================================
// Creation and Retrieval
//=========================================================================================

#[utoipa::path(
    post,
    path = "/create-session",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created as pending with no fee", body = CreatedResponse),
        (status = 400, body = ErrorBody),
        (status = 403, description = "Tutors may only create their own sessions", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<CreateSessionRequest>,
) -> ApiResult<Json<CreatedResponse>> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    let tutor_email = if req.tutor_email.trim().is_empty() {
        claims.email.clone()
    } else {
        req.tutor_email.trim().to_string()
    };
    if !claims.may_act_for(&tutor_email) {
        return Err(ApiError::Forbidden);
    }

    let session = state
        .lifecycle
        .create(NewSession {
            title: req.title,
            tutor_name: req.tutor_name,
            tutor_email,
            description: req.description,
            registration_start_date: req.registration_start_date,
            registration_end_date: req.registration_end_date,
            class_start_date: req.class_start_date,
            class_end_date: req.class_end_date,
            duration: req.duration,
            image: req.image,
        })
        .await?;
    Ok(Json(CreatedResponse::new(session.id)))
}

/// One page of sessions, as a bare array.
#[utoipa::path(
    get,
    path = "/sessions",
    params(PageQuery),
    responses((status = 200, body = Vec<SessionResponse>))
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<PageQuery>,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let page = state.lifecycle.page(query.to_request()).await?;
    Ok(Json(page.items.into_iter().map(SessionResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/allSessions",
    params(PageQuery),
    responses((status = 200, body = SessionPageResponse))
)]
pub async fn all_sessions_handler(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<PageQuery>,
) -> ApiResult<Json<SessionPageResponse>> {
    let page = state.lifecycle.page(query.to_request()).await?;
    Ok(Json(page.into()))
}

/// The same page shape, for the tutor and admin dashboards.
#[utoipa::path(
    get,
    path = "/all-sessions-tutor",
    params(PageQuery),
    responses((status = 200, body = SessionPageResponse)),
    security(("bearer" = []))
)]
pub async fn tutor_sessions_handler(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<PageQuery>,
) -> ApiResult<Json<SessionPageResponse>> {
    let page = state.lifecycle.page(query.to_request()).await?;
    Ok(Json(page.into()))
}

#[utoipa::path(
    get,
    path = "/allsessionIds",
    responses((status = 200, body = Vec<SessionResponse>)),
    security(("bearer" = []))
)]
pub async fn all_session_ids_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let sessions = state.lifecycle.all().await?;
    Ok(Json(sessions.into_iter().map(SessionResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, body = SessionDetailsResponse),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn session_details_handler(
    State(state): State<Arc<AppState>>,
    AppPath(session_id): AppPath<Uuid>,
) -> ApiResult<Json<SessionDetailsResponse>> {
    let session = state.lifecycle.get(session_id).await?;
    Ok(Json(SessionDetailsResponse {
        session_details: session.into(),
    }))
}

//=========================================================================================
// Lifecycle Transitions
//=========================================================================================

#[utoipa::path(
    patch,
    path = "/sessions/{id}/reject",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "pending → rejected; no-op from any other state", body = TransitionResponse),
        (status = 404, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn reject_handler(
    State(state): State<Arc<AppState>>,
    AppPath(session_id): AppPath<Uuid>,
) -> ApiResult<Json<TransitionResponse>> {
    Ok(Json(state.lifecycle.reject(session_id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/sessions/{id}/payment-approved",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "pending → approved; no-op from any other state", body = TransitionResponse),
        (status = 404, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn payment_approved_handler(
    State(state): State<Arc<AppState>>,
    AppPath(session_id): AppPath<Uuid>,
) -> ApiResult<Json<TransitionResponse>> {
    Ok(Json(state.lifecycle.approve_paid(session_id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/sessions/{id}/free-approved",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "pending → approved; no-op from any other state", body = TransitionResponse),
        (status = 404, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn free_approved_handler(
    State(state): State<Arc<AppState>>,
    AppPath(session_id): AppPath<Uuid>,
) -> ApiResult<Json<TransitionResponse>> {
    Ok(Json(state.lifecycle.approve_free(session_id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/sessions/{id}/rejected-pending",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "rejected → pending; no-op from any other state", body = TransitionResponse),
        (status = 403, description = "Another tutor's session", body = ErrorBody),
        (status = 404, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn rejected_pending_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppPath(session_id): AppPath<Uuid>,
) -> ApiResult<Json<TransitionResponse>> {
    let session = state.lifecycle.get(session_id).await?;
    if !claims.may_act_for(&session.tutor_email) {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(state.lifecycle.unreject(session_id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/sessions/{id}/approved-pending",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "approved → pending; no-op from any other state", body = TransitionResponse),
        (status = 404, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn approved_pending_handler(
    State(state): State<Arc<AppState>>,
    AppPath(session_id): AppPath<Uuid>,
) -> ApiResult<Json<TransitionResponse>> {
    Ok(Json(state.lifecycle.revert_approval(session_id).await?.into()))
}

/// Same transition as `/sessions/{id}/approved-pending`, used by the
/// dashboard's status dropdown.
#[utoipa::path(
    patch,
    path = "/sessionsU/{id}/update-drop",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "approved → pending; no-op from any other state", body = TransitionResponse),
        (status = 404, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_drop_handler(
    State(state): State<Arc<AppState>>,
    AppPath(session_id): AppPath<Uuid>,
) -> ApiResult<Json<TransitionResponse>> {
    Ok(Json(state.lifecycle.revert_approval(session_id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/paid-approved/{id}",
    params(("id" = Uuid, Path, description = "Session id"), FeeQuery),
    responses(
        (status = 200, description = "Fee set and session approved, from any state", body = TransitionResponse),
        (status = 400, description = "Missing or invalid fee", body = ErrorBody),
        (status = 404, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn paid_approved_handler(
    State(state): State<Arc<AppState>>,
    AppPath(session_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<FeeQuery>,
) -> ApiResult<Json<TransitionResponse>> {
    let fee = query
        .add_fee
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("addFee query parameter is required".to_string()))?
        .parse::<RegistrationFee>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let outcome = state.lifecycle.set_fee_and_approve(session_id, fee).await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    delete,
    path = "/sessionsD/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, body = DeleteResult),
        (status = 404, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    AppPath(session_id): AppPath<Uuid>,
) -> ApiResult<Json<DeleteResult>> {
    state.lifecycle.delete(session_id).await.map_err(|e| match e {
        PortError::NotFound(_) => ApiError::NotFound("Session not found.".to_string()),
        other => other.into(),
    })?;
    Ok(Json(DeleteResult {
        message: "Session deleted successfully.".to_string(),
        deleted_count: 1,
    }))
}
