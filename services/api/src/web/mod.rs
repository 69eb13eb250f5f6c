pub mod auth;
pub mod bookings;
pub mod extract;
pub mod materials;
pub mod middleware;
pub mod notes;
pub mod payments;
pub mod rest;
pub mod sessions;
pub mod state;
pub mod users;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use middleware::{require_admin, require_auth, require_tutor};
use state::AppState;

/// Builds the API router with every route group and its access guard.
///
/// Swagger UI and CORS are added by the binary.
pub fn build_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/", get(rest::liveness_handler))
        .route("/signup", post(auth::signup_handler))
        .route("/login", post(auth::login_handler))
        .route("/information", get(users::information_handler))
        .route("/sessions", get(sessions::list_sessions_handler))
        .route("/allSessions", get(sessions::all_sessions_handler))
        .route("/sessions/{id}", get(sessions::session_details_handler))
        .route("/sessions/{id}/reviews", get(bookings::list_reviews_handler));

    // Any signed-in user
    let authenticated_routes = Router::new()
        .route("/users/admin/{email}", get(users::is_admin_handler))
        .route("/users/tutor/{email}", get(users::is_tutor_handler))
        .route("/notes", post(notes::create_note_handler))
        .route("/all-notes", get(notes::list_notes_handler))
        .route(
            "/notes/{id}",
            put(notes::update_note_handler).delete(notes::delete_note_handler),
        )
        .route("/postData", get(bookings::list_bookings_handler))
        .route("/postData/{id}", post(bookings::book_session_handler))
        .route("/booked-sessions", get(bookings::booked_sessions_handler))
        .route("/sessions/{id}/review", post(bookings::create_review_handler))
        .route("/materials/{id}", get(materials::session_materials_handler))
        .route(
            "/create-payment-intent",
            post(payments::create_payment_intent_handler),
        )
        .layer(from_fn_with_state(state.clone(), require_auth));

    let tutor_routes = Router::new()
        .route("/create-session", post(sessions::create_session_handler))
        .route(
            "/sessions/{id}/rejected-pending",
            patch(sessions::rejected_pending_handler),
        )
        .route("/all-sessions-tutor", get(sessions::tutor_sessions_handler))
        .route("/allsessionIds", get(sessions::all_session_ids_handler))
        .route("/upload-material", post(materials::upload_material_handler))
        .route("/getAllMeterials", get(materials::all_materials_handler))
        .route(
            "/materials/tutor/{tutor_email}",
            get(materials::tutor_materials_handler),
        )
        .route("/materials/{id}", delete(materials::delete_material_handler))
        .route(
            "/updateMeterial/{id}",
            patch(materials::update_material_handler),
        )
        .layer(from_fn(require_tutor))
        .layer(from_fn_with_state(state.clone(), require_auth));

    let admin_routes = Router::new()
        .route("/users", get(users::list_users_handler))
        .route("/users/{id}", patch(users::update_role_handler))
        .route("/sessions/{id}/reject", patch(sessions::reject_handler))
        .route(
            "/sessions/{id}/payment-approved",
            patch(sessions::payment_approved_handler),
        )
        .route(
            "/sessions/{id}/free-approved",
            patch(sessions::free_approved_handler),
        )
        .route(
            "/sessions/{id}/approved-pending",
            patch(sessions::approved_pending_handler),
        )
        .route(
            "/sessionsU/{id}/update-drop",
            patch(sessions::update_drop_handler),
        )
        .route("/paid-approved/{id}", patch(sessions::paid_approved_handler))
        .route("/sessionsD/{id}", delete(sessions::delete_session_handler))
        .layer(from_fn(require_admin))
        .layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(tutor_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
