//! services/api/src/web/notes.rs
//!
//! Personal notes. A note belongs to the email of whoever created it.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use educonnect_core::domain::{NewNote, Note};
use educonnect_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::token::Claims;
use crate::web::extract::{AppJson, AppPath, AppQuery};
use crate::web::rest::{InsertResult, MessageResponse};
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_email: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            user_email: n.user_email,
            title: n.title,
            description: n.description,
            created_at: n.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct NoteRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotesQuery {
    pub email: Option<String>,
}

fn note_not_found() -> ApiError {
    ApiError::NotFound("Note not found".to_string())
}

/// Checks that the caller wrote the note. Admins may act on any note.
async fn ensure_note_owner(state: &AppState, claims: &Claims, note_id: Uuid) -> ApiResult<()> {
    let note = match state.store.get_note(note_id).await {
        Ok(note) => note,
        Err(PortError::NotFound(_)) => return Err(note_not_found()),
        Err(e) => return Err(e.into()),
    };
    if !claims.may_act_for(&note.user_email) {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/notes",
    request_body = NoteRequest,
    responses(
        (status = 200, body = InsertResult),
        (status = 400, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<NoteRequest>,
) -> ApiResult<Json<InsertResult>> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    let note = state
        .store
        .insert_note(NewNote {
            user_email: claims.email,
            title: req.title,
            description: req.description,
        })
        .await?;
    Ok(Json(InsertResult::new(note.id)))
}

/// GET /all-notes?email= - Notes owned by one user
#[utoipa::path(
    get,
    path = "/all-notes",
    params(NotesQuery),
    responses(
        (status = 200, body = Vec<NoteResponse>),
        (status = 400, description = "Missing email", body = ErrorBody),
        (status = 403, description = "Another user's notes", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn list_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppQuery(query): AppQuery<NotesQuery>,
) -> ApiResult<Json<Vec<NoteResponse>>> {
    let email = query
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email query parameter is required".to_string()))?;

    if !claims.may_act_for(email) {
        return Err(ApiError::Forbidden);
    }

    let notes = state.store.list_notes_by_email(email).await?;
    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note id")),
    request_body = NoteRequest,
    responses(
        (status = 200, body = MessageResponse),
        (status = 403, description = "Another user's note", body = ErrorBody),
        (status = 404, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppPath(note_id): AppPath<Uuid>,
    AppJson(req): AppJson<NoteRequest>,
) -> ApiResult<Json<MessageResponse>> {
    ensure_note_owner(&state, &claims, note_id).await?;
    if !state
        .store
        .update_note(note_id, &req.title, &req.description)
        .await?
    {
        return Err(note_not_found());
    }
    Ok(Json(MessageResponse::new("Note updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note id")),
    responses(
        (status = 200, body = MessageResponse),
        (status = 403, description = "Another user's note", body = ErrorBody),
        (status = 404, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppPath(note_id): AppPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    ensure_note_owner(&state, &claims, note_id).await?;
    if !state.store.delete_note(note_id).await? {
        return Err(note_not_found());
    }
    Ok(Json(MessageResponse::new("Note deleted successfully")))
}
