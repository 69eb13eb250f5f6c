//! services/api/src/web/bookings.rs
//!
//! Booking a session and reviewing it.
//!
//! A booking stores a copy of the session as it was at booking time; later
//! edits to the session are not reflected in existing bookings.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use educonnect_core::domain::{BookedSession, NewReview, Review};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::token::Claims;
use crate::web::extract::{AppJson, AppPath, AppQuery};
use crate::web::rest::InsertResult;
use crate::web::sessions::SessionResponse;
use crate::web::state::AppState;

//=========================================================================================
// Bookings
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_email: Option<String>,
    pub booked_at: DateTime<Utc>,
    /// The session as it was when booked.
    pub session: SessionResponse,
}

impl From<BookedSession> for BookingResponse {
    fn from(b: BookedSession) -> Self {
        Self {
            id: b.id,
            session_id: b.session_id,
            student_email: b.student_email,
            booked_at: b.booked_at,
            session: b.snapshot.into(),
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingQuery {
    /// Only bookings made by this student.
    pub email: Option<String>,
}

#[utoipa::path(
    post,
    path = "/postData/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, body = InsertResult),
        (status = 404, body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn book_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppPath(session_id): AppPath<Uuid>,
) -> ApiResult<Json<InsertResult>> {
    let session = state.lifecycle.get(session_id).await?;
    let booking = state
        .store
        .insert_booking(session, Some(claims.email.clone()))
        .await?;
    info!(booking_id = %booking.id, %session_id, student = %claims.email, "Session booked");
    Ok(Json(InsertResult::new(booking.id)))
}

async fn bookings(state: &AppState, query: BookingQuery) -> ApiResult<Json<Vec<BookingResponse>>> {
    let email = query.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let bookings = state.store.list_bookings(email).await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/postData",
    params(BookingQuery),
    responses((status = 200, body = Vec<BookingResponse>)),
    security(("bearer" = []))
)]
pub async fn list_bookings_handler(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<BookingQuery>,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    bookings(&state, query).await
}

#[utoipa::path(
    get,
    path = "/booked-sessions",
    params(BookingQuery),
    responses((status = 200, body = Vec<BookingResponse>)),
    security(("bearer" = []))
)]
pub async fn booked_sessions_handler(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<BookingQuery>,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    bookings(&state, query).await
}

//=========================================================================================
// Reviews
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    /// 1 to 5.
    pub rating: u8,
    #[serde(default)]
    pub review_text: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_email: Option<String>,
    pub rating: u8,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            session_id: r.session_id,
            student_email: r.student_email,
            rating: r.rating,
            review_text: r.review_text,
            created_at: r.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/review",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = CreateReviewRequest,
    responses(
        (status = 200, body = InsertResult),
        (status = 400, description = "Rating outside 1..=5", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_review_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppPath(session_id): AppPath<Uuid>,
    AppJson(req): AppJson<CreateReviewRequest>,
) -> ApiResult<Json<InsertResult>> {
    if !(1..=5).contains(&req.rating) {
        return Err(ApiError::BadRequest(
            "rating must be between 1 and 5".to_string(),
        ));
    }
    let review = state
        .store
        .insert_review(NewReview {
            session_id,
            student_email: Some(claims.email),
            rating: req.rating,
            review_text: req.review_text,
        })
        .await?;
    Ok(Json(InsertResult::new(review.id)))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/reviews",
    params(("id" = Uuid, Path, description = "Session id")),
    responses((status = 200, body = Vec<ReviewResponse>))
)]
pub async fn list_reviews_handler(
    State(state): State<Arc<AppState>>,
    AppPath(session_id): AppPath<Uuid>,
) -> ApiResult<Json<Vec<ReviewResponse>>> {
    let reviews = state.store.list_reviews_for_session(session_id).await?;
    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}
