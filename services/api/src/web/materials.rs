//! services/api/src/web/materials.rs
//!
//! Study material uploaded by tutors for their sessions.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use educonnect_core::domain::{Material, NewMaterial};
use educonnect_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::token::Claims;
use crate::web::extract::{AppJson, AppPath};
use crate::web::rest::{CreatedResponse, DeleteResult, UpdateResult};
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub session_id: Uuid,
    pub tutor_email: String,
    pub image: Option<String>,
    pub link: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Material> for MaterialResponse {
    fn from(m: Material) -> Self {
        Self {
            id: m.id,
            title: m.title,
            session_id: m.session_id,
            tutor_email: m.tutor_email,
            image: m.image,
            link: m.link,
            uploaded_at: m.uploaded_at,
        }
    }
}

fn material_not_found() -> ApiError {
    ApiError::NotFound("Material not found".to_string())
}

/// Checks that the caller uploaded the material. Admins may act on any
/// material.
async fn ensure_material_owner(
    state: &AppState,
    claims: &Claims,
    material_id: Uuid,
) -> ApiResult<()> {
    let material = match state.store.get_material(material_id).await {
        Ok(material) => material,
        Err(PortError::NotFound(_)) => return Err(material_not_found()),
        Err(e) => return Err(e.into()),
    };
    if !claims.may_act_for(&material.tutor_email) {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

fn to_responses(materials: Vec<Material>) -> Json<Vec<MaterialResponse>> {
    Json(materials.into_iter().map(MaterialResponse::from).collect())
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadMaterialRequest {
    pub title: String,
    pub session_id: Uuid,
    /// Defaults to the caller's email.
    pub tutor_email: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaterialRequest {
    pub updated_title: String,
}

#[utoipa::path(
    post,
    path = "/upload-material",
    request_body = UploadMaterialRequest,
    responses(
        (status = 200, body = CreatedResponse),
        (status = 400, body = ErrorBody),
        (status = 403, description = "Uploading as another tutor", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn upload_material_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<UploadMaterialRequest>,
) -> ApiResult<Json<CreatedResponse>> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    let tutor_email = req
        .tutor_email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| claims.email.clone());
    if !claims.may_act_for(&tutor_email) {
        return Err(ApiError::Forbidden);
    }

    let material = state
        .store
        .insert_material(NewMaterial {
            title: req.title,
            session_id: req.session_id,
            tutor_email,
            image: req.image,
            link: req.link,
        })
        .await?;
    info!(material_id = %material.id, session_id = %material.session_id, "Material uploaded");
    Ok(Json(CreatedResponse::new(material.id)))
}

#[utoipa::path(
    get,
    path = "/getAllMeterials",
    responses((status = 200, body = Vec<MaterialResponse>)),
    security(("bearer" = []))
)]
pub async fn all_materials_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<MaterialResponse>>> {
    Ok(to_responses(state.store.list_materials().await?))
}

/// Materials attached to one session.
#[utoipa::path(
    get,
    path = "/materials/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses((status = 200, body = Vec<MaterialResponse>)),
    security(("bearer" = []))
)]
pub async fn session_materials_handler(
    State(state): State<Arc<AppState>>,
    AppPath(session_id): AppPath<Uuid>,
) -> ApiResult<Json<Vec<MaterialResponse>>> {
    Ok(to_responses(
        state.store.list_materials_for_session(session_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/materials/tutor/{tutor_email}",
    params(("tutor_email" = String, Path, description = "Tutor's email")),
    responses((status = 200, body = Vec<MaterialResponse>)),
    security(("bearer" = []))
)]
pub async fn tutor_materials_handler(
    State(state): State<Arc<AppState>>,
    AppPath(tutor_email): AppPath<String>,
) -> ApiResult<Json<Vec<MaterialResponse>>> {
    Ok(to_responses(
        state.store.list_materials_by_tutor(&tutor_email).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/updateMeterial/{id}",
    params(("id" = Uuid, Path, description = "Material id")),
    request_body = UpdateMaterialRequest,
    responses(
        (status = 200, body = UpdateResult),
        (status = 403, description = "Another tutor's material", body = ErrorBody),
        (status = 404, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_material_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppPath(material_id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateMaterialRequest>,
) -> ApiResult<Json<UpdateResult>> {
    let title = req.updated_title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("updatedTitle is required".to_string()));
    }
    ensure_material_owner(&state, &claims, material_id).await?;
    if !state.store.update_material_title(material_id, title).await? {
        return Err(material_not_found());
    }
    Ok(Json(UpdateResult::matched(1)))
}

#[utoipa::path(
    delete,
    path = "/materials/{id}",
    params(("id" = Uuid, Path, description = "Material id")),
    responses(
        (status = 200, body = DeleteResult),
        (status = 403, description = "Another tutor's material", body = ErrorBody),
        (status = 404, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_material_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppPath(material_id): AppPath<Uuid>,
) -> ApiResult<Json<DeleteResult>> {
    ensure_material_owner(&state, &claims, material_id).await?;
    if !state.store.delete_material(material_id).await? {
        return Err(material_not_found());
    }
    info!(%material_id, "Material deleted");
    Ok(Json(DeleteResult {
        message: "Material deleted successfully".to_string(),
        deleted_count: 1,
    }))
}
