//! Integration tests for the EduConnect HTTP API.
//!
//! The router runs against the in-memory store and a recording payment
//! processor, so no database or network is needed.

use api_lib::{
    adapters::MemoryStore,
    config::Config,
    token::issue_token,
    web::{build_router, state::AppState},
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use educonnect_core::domain::{PaymentIntent, PaymentIntentRequest, Role};
use educonnect_core::ports::{PaymentService, PortError, PortResult};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt; // for `oneshot`

const SECRET: &str = "test-secret";
const ADMIN: &str = "admin@educonnect.test";
const TUTOR: &str = "tutor@educonnect.test";
const STUDENT: &str = "student@educonnect.test";

/// Records every request and answers with a fixed client secret.
#[derive(Default)]
struct RecordingPayments {
    requests: Mutex<Vec<PaymentIntentRequest>>,
    fail_with: Option<PortError>,
}

#[async_trait]
impl PaymentService for RecordingPayments {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> PortResult<PaymentIntent> {
        self.requests.lock().unwrap().push(request);
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(PaymentIntent {
                id: "pi_test".to_string(),
                client_secret: "pi_test_secret_123".to_string(),
            }),
        }
    }
}

struct TestApp {
    router: Router,
    payments: Arc<RecordingPayments>,
}

fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(SECRET.to_string()),
        _ => None,
    })
    .unwrap()
}

fn setup_app_with(payments: RecordingPayments) -> TestApp {
    let payments = Arc::new(payments);
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        payments.clone(),
        Arc::new(test_config()),
    );
    TestApp {
        router: build_router(Arc::new(state)),
        payments,
    }
}

fn setup_app() -> TestApp {
    setup_app_with(RecordingPayments::default())
}

fn token_for(email: &str, role: Role) -> String {
    issue_token(email, role, SECRET, chrono::Duration::hours(1)).unwrap()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

async fn create_session(app: &TestApp, title: &str) -> String {
    let tutor = token_for(TUTOR, Role::Tutor);
    let (status, body) = send(
        app,
        request(
            "POST",
            "/create-session",
            Some(&tutor),
            Some(json!({ "title": title, "tutorName": "Tess", "duration": "2h" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    body["insertedId"].as_str().unwrap().to_string()
}

async fn admin_patch(app: &TestApp, uri: &str) -> (StatusCode, Value) {
    let admin = token_for(ADMIN, Role::Admin);
    send(app, request("PATCH", uri, Some(&admin), None)).await
}

// =============================================================================
// Liveness and access control
// =============================================================================

#[tokio::test]
async fn liveness_needs_no_token() {
    let app = setup_app();
    let (status, body) = send(&app, request("GET", "/", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("EduConnect Server is running...".to_string()));
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = setup_app();
    let (status, body) = send(&app, request("GET", "/booked-sessions", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized access");
}

#[tokio::test]
async fn bad_or_expired_token_is_forbidden() {
    let app = setup_app();
    let (status, body) = send(
        &app,
        request("GET", "/booked-sessions", Some("not.a.jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Forbidden access");

    let expired = issue_token(STUDENT, Role::Student, SECRET, chrono::Duration::hours(-1)).unwrap();
    let (status, _) = send(&app, request("GET", "/booked-sessions", Some(&expired), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let foreign =
        issue_token(STUDENT, Role::Student, "other-secret", chrono::Duration::hours(1)).unwrap();
    let (status, _) = send(&app, request("GET", "/booked-sessions", Some(&foreign), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn wrong_role_is_forbidden() {
    let app = setup_app();
    let student = token_for(STUDENT, Role::Student);
    let tutor = token_for(TUTOR, Role::Tutor);

    let (status, _) = send(
        &app,
        request("POST", "/create-session", Some(&student), Some(json!({ "title": "x" }))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, request("GET", "/users", Some(&tutor), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = token_for(ADMIN, Role::Admin);
    let (status, _) = send(&app, request("GET", "/getAllMeterials", Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Signup and login
// =============================================================================

#[tokio::test]
async fn signup_is_idempotent_per_email() {
    let app = setup_app();
    let body = json!({ "name": "Sam", "email": STUDENT, "password": "hunter22" });

    let (status, first) = send(&app, request("POST", "/signup", None, Some(body.clone()))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["role"], "student");
    assert!(first.get("password").is_none());

    let (status, second) = send(&app, request("POST", "/signup", None, Some(body))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["_id"], second["_id"]);
}

#[tokio::test]
async fn signup_cannot_claim_admin() {
    let app = setup_app();
    let (status, _) = send(
        &app,
        request("POST", "/signup", None, Some(json!({ "email": "x@y.z", "role": "admin" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_issues_a_usable_token() {
    let app = setup_app();
    send(
        &app,
        request(
            "POST",
            "/signup",
            None,
            Some(json!({ "email": TUTOR, "password": "correct horse", "role": "tutor" })),
        ),
    )
    .await;

    let (status, _) = send(
        &app,
        request("POST", "/login", None, Some(json!({ "email": TUTOR, "password": "wrong" }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/login",
            None,
            Some(json!({ "email": TUTOR, "password": "correct horse" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "tutor");

    let token = body["token"].as_str().unwrap();
    let (status, flag) = send(
        &app,
        request("GET", &format!("/users/tutor/{}", TUTOR), Some(token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flag["isTutor"], true);

    let (status, _) = send(
        &app,
        request("GET", &format!("/users/admin/{}", ADMIN), Some(token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test]
async fn new_sessions_start_pending_and_free() {
    let app = setup_app();
    let id = create_session(&app, "Algebra").await;

    let (status, body) = send(&app, request("GET", &format!("/sessions/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionDetails"]["status"], "pending");
    assert_eq!(body["sessionDetails"]["registrationFee"], 0.0);
    assert_eq!(body["sessionDetails"]["tutorEmail"], TUTOR);
}

#[tokio::test]
async fn reject_twice_is_a_no_op() {
    let app = setup_app();
    let id = create_session(&app, "Geometry").await;

    let (status, first) = admin_patch(&app, &format!("/sessions/{}/reject", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["applied"], true);
    assert_eq!(first["currentStatus"], "rejected");

    let (status, second) = admin_patch(&app, &format!("/sessions/{}/reject", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["applied"], false);
    assert_eq!(second["currentStatus"], "rejected");
}

#[tokio::test]
async fn rejected_session_cannot_be_approved() {
    let app = setup_app();
    let id = create_session(&app, "Chemistry").await;
    admin_patch(&app, &format!("/sessions/{}/reject", id)).await;

    let (_, body) = admin_patch(&app, &format!("/sessions/{}/payment-approved", id)).await;
    assert_eq!(body["applied"], false);
    assert_eq!(body["currentStatus"], "rejected");

    let tutor = token_for(TUTOR, Role::Tutor);
    let (_, body) = send(
        &app,
        request("PATCH", &format!("/sessions/{}/rejected-pending", id), Some(&tutor), None),
    )
    .await;
    assert_eq!(body["applied"], true);
    assert_eq!(body["currentStatus"], "pending");

    let (_, body) = admin_patch(&app, &format!("/sessions/{}/free-approved", id)).await;
    assert_eq!(body["applied"], true);
    assert_eq!(body["currentStatus"], "approved");
}

#[tokio::test]
async fn paid_approval_sets_the_fee() {
    let app = setup_app();
    let id = create_session(&app, "Physics").await;

    let (status, body) = admin_patch(&app, &format!("/paid-approved/{}?addFee=50", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentStatus"], "approved");
    assert_eq!(body["session"]["registrationFee"], 50.0);

    let (status, _) = admin_patch(&app, &format!("/paid-approved/{}?addFee=-5", id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = admin_patch(&app, &format!("/paid-approved/{}", id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn paid_approval_overrides_rejected_and_approved_sessions() {
    let app = setup_app();

    let rejected = create_session(&app, "Astronomy").await;
    admin_patch(&app, &format!("/sessions/{}/reject", rejected)).await;
    let (status, body) = admin_patch(&app, &format!("/paid-approved/{}?addFee=30", rejected)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"], true);
    assert_eq!(body["currentStatus"], "approved");
    assert_eq!(body["session"]["registrationFee"], 30.0);

    let approved = create_session(&app, "Geology").await;
    admin_patch(&app, &format!("/sessions/{}/free-approved", approved)).await;
    let (status, body) = admin_patch(&app, &format!("/paid-approved/{}?addFee=15", approved)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentStatus"], "approved");
    assert_eq!(body["session"]["registrationFee"], 15.0);
}

#[tokio::test]
async fn only_the_owning_tutor_reopens_a_rejected_session() {
    let app = setup_app();
    let id = create_session(&app, "Philosophy").await;
    admin_patch(&app, &format!("/sessions/{}/reject", id)).await;
    let uri = format!("/sessions/{}/rejected-pending", id);

    let intruder = token_for("tutor2@educonnect.test", Role::Tutor);
    let (status, body) = send(&app, request("PATCH", &uri, Some(&intruder), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Forbidden access");

    let (_, details) = send(&app, request("GET", &format!("/sessions/{}", id), None, None)).await;
    assert_eq!(details["sessionDetails"]["status"], "rejected");

    let tutor = token_for(TUTOR, Role::Tutor);
    let (status, body) = send(&app, request("PATCH", &uri, Some(&tutor), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentStatus"], "pending");

    let missing = format!("/sessions/{}/rejected-pending", uuid::Uuid::new_v4());
    let (status, _) = send(&app, request("PATCH", &missing, Some(&tutor), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reverting_an_approval_only_applies_once() {
    let app = setup_app();
    let id = create_session(&app, "Biology").await;
    admin_patch(&app, &format!("/sessions/{}/free-approved", id)).await;

    let (_, first) = admin_patch(&app, &format!("/sessionsU/{}/update-drop", id)).await;
    assert_eq!(first["applied"], true);
    assert_eq!(first["currentStatus"], "pending");

    let (_, second) = admin_patch(&app, &format!("/sessions/{}/approved-pending", id)).await;
    assert_eq!(second["applied"], false);
    assert_eq!(second["currentStatus"], "pending");
}

#[tokio::test]
async fn transitions_on_unknown_sessions_are_not_found() {
    let app = setup_app();
    let missing = uuid::Uuid::new_v4();
    let admin = token_for(ADMIN, Role::Admin);

    let (status, _) = admin_patch(&app, &format!("/sessions/{}/reject", missing)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/sessionsD/{}", missing), Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Session not found.");

    let (status, _) = send(&app, request("GET", "/sessions/not-a-uuid", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_removes_the_session() {
    let app = setup_app();
    let id = create_session(&app, "History").await;
    let admin = token_for(ADMIN, Role::Admin);

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/sessionsD/{}", id), Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 1);

    let (status, _) = send(&app, request("GET", &format!("/sessions/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn session_pages_report_totals() {
    let app = setup_app();
    for i in 0..8 {
        create_session(&app, &format!("Session {}", i)).await;
    }

    let (_, body) = send(&app, request("GET", "/allSessions", None, None)).await;
    assert_eq!(body["totalSessions"], 8);
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["sessions"].as_array().unwrap().len(), 6);

    let (_, body) = send(&app, request("GET", "/allSessions?page=2&limit=6", None, None)).await;
    assert_eq!(body["sessions"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, request("GET", "/sessions?page=0&limit=-3", None, None)).await;
    assert_eq!(body.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn page_past_the_end_is_empty_but_keeps_totals() {
    let app = setup_app();
    for i in 0..8 {
        create_session(&app, &format!("Session {}", i)).await;
    }

    let (status, body) = send(&app, request("GET", "/allSessions?page=99", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["sessions"].as_array().unwrap().is_empty());
    assert_eq!(body["totalSessions"], 8);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["currentPage"], 99);
}

// =============================================================================
// Materials, bookings and notes
// =============================================================================

#[tokio::test]
async fn materials_are_listed_by_session_and_tutor() {
    let app = setup_app();
    let session_id = create_session(&app, "Statistics").await;
    let tutor = token_for(TUTOR, Role::Tutor);
    let student = token_for(STUDENT, Role::Student);

    let (status, created) = send(
        &app,
        request(
            "POST",
            "/upload-material",
            Some(&tutor),
            Some(json!({ "title": "Slides", "sessionId": session_id, "link": "https://drive/x" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let material_id = created["insertedId"].as_str().unwrap().to_string();

    let (_, listed) = send(
        &app,
        request("GET", &format!("/materials/{}", session_id), Some(&student), None),
    )
    .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (_, by_tutor) = send(
        &app,
        request("GET", &format!("/materials/tutor/{}", TUTOR), Some(&tutor), None),
    )
    .await;
    assert_eq!(by_tutor[0]["title"], "Slides");

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/materials/{}", material_id), Some(&student), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/materials/{}", material_id), Some(&tutor), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/materials/{}", material_id), Some(&tutor), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Material not found");
}

#[tokio::test]
async fn tutors_cannot_touch_another_tutors_materials() {
    let app = setup_app();
    let session_id = create_session(&app, "Calculus").await;
    let tutor = token_for(TUTOR, Role::Tutor);
    let intruder = token_for("tutor2@educonnect.test", Role::Tutor);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/upload-material",
            Some(&intruder),
            Some(json!({ "title": "Forged", "sessionId": session_id, "tutorEmail": TUTOR })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, created) = send(
        &app,
        request(
            "POST",
            "/upload-material",
            Some(&tutor),
            Some(json!({ "title": "Notes", "sessionId": session_id, "tutorEmail": TUTOR })),
        ),
    )
    .await;
    let material_id = created["insertedId"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        request(
            "PATCH",
            &format!("/updateMeterial/{}", material_id),
            Some(&intruder),
            Some(json!({ "updatedTitle": "Hijacked" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/materials/{}", material_id), Some(&intruder), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, owned) = send(
        &app,
        request("GET", &format!("/materials/tutor/{}", TUTOR), Some(&tutor), None),
    )
    .await;
    let owned = owned.as_array().unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0]["title"], "Notes");

    let admin = token_for(ADMIN, Role::Admin);
    let (status, _) = send(
        &app,
        request("DELETE", &format!("/materials/{}", material_id), Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn bookings_keep_a_snapshot_of_the_session() {
    let app = setup_app();
    let session_id = create_session(&app, "Economics").await;
    let student = token_for(STUDENT, Role::Student);

    let (status, _) = send(
        &app,
        request("POST", &format!("/postData/{}", session_id), Some(&student), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    admin_patch(&app, &format!("/paid-approved/{}?addFee=20", session_id)).await;

    let (_, bookings) = send(
        &app,
        request("GET", &format!("/booked-sessions?email={}", STUDENT), Some(&student), None),
    )
    .await;
    let bookings = bookings.as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["studentEmail"], STUDENT);
    assert_eq!(bookings[0]["session"]["status"], "pending");
    assert_eq!(bookings[0]["session"]["registrationFee"], 0.0);

    let (status, _) = send(
        &app,
        request("POST", &format!("/postData/{}", uuid::Uuid::new_v4()), Some(&student), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reviews_require_a_valid_rating() {
    let app = setup_app();
    let session_id = create_session(&app, "Music").await;
    let student = token_for(STUDENT, Role::Student);
    let uri = format!("/sessions/{}/review", session_id);

    let (status, _) = send(
        &app,
        request("POST", &uri, Some(&student), Some(json!({ "rating": 6 }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request("POST", &uri, Some(&student), Some(json!({ "rating": 4, "reviewText": "Clear" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, reviews) = send(
        &app,
        request("GET", &format!("/sessions/{}/reviews", session_id), None, None),
    )
    .await;
    assert_eq!(reviews[0]["rating"], 4);
    assert_eq!(reviews[0]["studentEmail"], STUDENT);
}

#[tokio::test]
async fn notes_belong_to_their_author() {
    let app = setup_app();
    let student = token_for(STUDENT, Role::Student);
    let other = token_for("other@educonnect.test", Role::Student);

    let (_, created) = send(
        &app,
        request(
            "POST",
            "/notes",
            Some(&student),
            Some(json!({ "title": "Week 1", "description": "Limits" })),
        ),
    )
    .await;
    let note_id = created["insertedId"].as_str().unwrap().to_string();

    let (status, body) = send(&app, request("GET", "/all-notes", Some(&student), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email query parameter is required");

    let notes_uri = format!("/all-notes?email={}", STUDENT);
    let (status, _) = send(&app, request("GET", &notes_uri, Some(&other), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, notes) = send(&app, request("GET", &notes_uri, Some(&student), None)).await;
    assert_eq!(notes[0]["title"], "Week 1");

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/notes/{}", note_id),
            Some(&student),
            Some(json!({ "title": "Week 1 (rev)", "description": "Limits and continuity" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Note updated successfully");

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/notes/{}", note_id), Some(&student), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/notes/{}", note_id), Some(&student), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Note not found");
}

#[tokio::test]
async fn notes_cannot_be_edited_or_deleted_by_other_users() {
    let app = setup_app();
    let student = token_for(STUDENT, Role::Student);
    let other = token_for("other@educonnect.test", Role::Student);

    let (_, created) = send(
        &app,
        request(
            "POST",
            "/notes",
            Some(&student),
            Some(json!({ "title": "Private", "description": "Mine" })),
        ),
    )
    .await;
    let note_uri = format!("/notes/{}", created["insertedId"].as_str().unwrap());

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &note_uri,
            Some(&other),
            Some(json!({ "title": "Overwritten", "description": "" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Forbidden access");

    let (status, _) = send(&app, request("DELETE", &note_uri, Some(&other), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let notes_uri = format!("/all-notes?email={}", STUDENT);
    let (_, notes) = send(&app, request("GET", &notes_uri, Some(&student), None)).await;
    assert_eq!(notes.as_array().unwrap().len(), 1);
    assert_eq!(notes[0]["title"], "Private");
    assert_eq!(notes[0]["description"], "Mine");

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/notes/{}", uuid::Uuid::new_v4()), Some(&other), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let admin = token_for(ADMIN, Role::Admin);
    let (status, _) = send(&app, request("DELETE", &note_uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Payments
// =============================================================================

#[tokio::test]
async fn payment_intent_is_relayed_in_minor_units() {
    let app = setup_app();
    let student = token_for(STUDENT, Role::Student);
    let session_id = uuid::Uuid::new_v4();

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/create-payment-intent",
            Some(&student),
            Some(json!({ "price": 12.99, "sessionId": session_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clientSecret"], "pi_test_secret_123");

    let recorded = app.payments.requests.lock().unwrap().clone();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].amount_minor, 1299);
    assert_eq!(recorded[0].currency, "usd");
    assert_eq!(
        recorded[0].idempotency_key.as_deref(),
        Some(PaymentIntentRequest::idempotency_key_for(session_id, STUDENT, 1299).as_str())
    );
}

#[tokio::test]
async fn payment_intent_rejects_bad_prices() {
    let app = setup_app();
    let student = token_for(STUDENT, Role::Student);

    for price in [json!(0), json!(-4), json!("abc"), json!(null)] {
        let (status, _) = send(
            &app,
            request(
                "POST",
                "/create-payment-intent",
                Some(&student),
                Some(json!({ "price": price })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "price {}", price);
    }
    assert!(app.payments.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_processor_is_service_unavailable() {
    let app = setup_app_with(RecordingPayments {
        fail_with: Some(PortError::Unavailable("timed out".to_string())),
        ..Default::default()
    });
    let student = token_for(STUDENT, Role::Student);

    let (status, _) = send(
        &app,
        request("POST", "/create-payment-intent", Some(&student), Some(json!({ "price": "25" }))),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
