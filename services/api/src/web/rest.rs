//! services/api/src/web/rest.rs
//!
//! Shared REST payloads, the liveness endpoint, and the master definition for
//! the OpenAPI specification.

use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

use crate::error::ErrorBody;
use crate::web::{auth, bookings, materials, notes, payments, sessions, users};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        liveness_handler,
        auth::signup_handler,
        auth::login_handler,
        users::information_handler,
        users::is_admin_handler,
        users::is_tutor_handler,
        users::list_users_handler,
        users::update_role_handler,
        sessions::create_session_handler,
        sessions::list_sessions_handler,
        sessions::all_sessions_handler,
        sessions::tutor_sessions_handler,
        sessions::all_session_ids_handler,
        sessions::session_details_handler,
        sessions::reject_handler,
        sessions::payment_approved_handler,
        sessions::free_approved_handler,
        sessions::rejected_pending_handler,
        sessions::approved_pending_handler,
        sessions::update_drop_handler,
        sessions::paid_approved_handler,
        sessions::delete_session_handler,
        materials::upload_material_handler,
        materials::all_materials_handler,
        materials::session_materials_handler,
        materials::tutor_materials_handler,
        materials::update_material_handler,
        materials::delete_material_handler,
        bookings::book_session_handler,
        bookings::list_bookings_handler,
        bookings::booked_sessions_handler,
        bookings::create_review_handler,
        bookings::list_reviews_handler,
        notes::create_note_handler,
        notes::list_notes_handler,
        notes::update_note_handler,
        notes::delete_note_handler,
        payments::create_payment_intent_handler,
    ),
    components(
        schemas(
            ErrorBody,
            InsertResult,
            CreatedResponse,
            UpdateResult,
            DeleteResult,
            MessageResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "EduConnect API", description = "Study sessions, materials, bookings and notes for the EduConnect tutoring platform.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer-token scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Shared Response Payloads
//=========================================================================================

/// Acknowledgement of a single inserted document.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: Uuid,
}

impl InsertResult {
    pub fn new(inserted_id: Uuid) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

/// Returned by the tutor-facing create endpoints.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub success: bool,
    pub inserted_id: Uuid,
}

impl CreatedResponse {
    pub fn new(inserted_id: Uuid) -> Self {
        Self {
            success: true,
            inserted_id,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateResult {
    pub fn matched(count: u64) -> Self {
        Self {
            matched_count: count,
            modified_count: count,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub message: String,
    pub deleted_count: u64,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

//=========================================================================================
// Liveness
//=========================================================================================

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Server is up", body = String))
)]
pub async fn liveness_handler() -> &'static str {
    "EduConnect Server is running..."
}
