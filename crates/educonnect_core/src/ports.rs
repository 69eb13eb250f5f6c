//! crates/educonnect_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{
    BookedSession, Material, NewMaterial, NewNote, NewReview, NewSession, NewUser, Note,
    PaymentIntent, PaymentIntentRequest, RegistrationFee, Review, Role, Session, SessionStatus,
    User, UserCredentials,
};
use async_trait::async_trait;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The backing service could not be reached or timed out. Safe to retry.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    /// The external service understood the request and refused it.
    #[error("Rejected by upstream service: {0}")]
    Rejected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The document store holding the users, sessions, materials, bookedSessions,
/// reviews and notes collections.
///
/// Every method is a single store operation. Implementations must make
/// `transition_status` and `insert_user_if_absent` atomic.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- Users ---
    /// Inserts the user unless one with the same email exists. Returns the
    /// stored user and whether it was created by this call.
    async fn insert_user_if_absent(&self, user: NewUser) -> PortResult<(User, bool)>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    /// Lists users, optionally filtered by a case-insensitive substring of
    /// their name or email.
    async fn list_users(&self, search: Option<&str>) -> PortResult<Vec<User>>;

    async fn list_users_by_role(&self, role: Role) -> PortResult<Vec<User>>;

    /// Returns `false` when no user has this id.
    async fn update_user_role(&self, user_id: Uuid, role: Role) -> PortResult<bool>;

    // --- Sessions ---
    /// Stores a new session with `SessionStatus::INITIAL` and a free fee.
    async fn insert_session(&self, session: NewSession) -> PortResult<Session>;

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session>;

    /// Sessions in creation order, skipping `offset` and returning at most `limit`.
    async fn list_sessions(&self, offset: u64, limit: u64) -> PortResult<Vec<Session>>;

    async fn count_sessions(&self) -> PortResult<u64>;

    /// Sets `status` to `to` only if it currently equals `from`, as one
    /// atomic operation. Returns the updated session, or `None` when no
    /// session with this id had status `from`.
    async fn transition_status(
        &self,
        session_id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
    ) -> PortResult<Option<Session>>;

    /// Unconditionally sets the fee and marks the session approved. Returns
    /// `None` when the session does not exist.
    async fn set_fee_and_approve(
        &self,
        session_id: Uuid,
        fee: RegistrationFee,
    ) -> PortResult<Option<Session>>;

    /// Returns `false` when nothing was deleted.
    async fn delete_session(&self, session_id: Uuid) -> PortResult<bool>;

    // --- Materials ---
    async fn insert_material(&self, material: NewMaterial) -> PortResult<Material>;

    async fn get_material(&self, material_id: Uuid) -> PortResult<Material>;

    async fn list_materials(&self) -> PortResult<Vec<Material>>;

    async fn list_materials_for_session(&self, session_id: Uuid) -> PortResult<Vec<Material>>;

    async fn list_materials_by_tutor(&self, tutor_email: &str) -> PortResult<Vec<Material>>;

    async fn update_material_title(&self, material_id: Uuid, title: &str) -> PortResult<bool>;

    async fn delete_material(&self, material_id: Uuid) -> PortResult<bool>;

    // --- Bookings ---
    /// Stores a booking holding a copy of `session`.
    async fn insert_booking(
        &self,
        session: Session,
        student_email: Option<String>,
    ) -> PortResult<BookedSession>;

    async fn list_bookings(&self, student_email: Option<&str>) -> PortResult<Vec<BookedSession>>;

    // --- Reviews ---
    async fn insert_review(&self, review: NewReview) -> PortResult<Review>;

    async fn list_reviews_for_session(&self, session_id: Uuid) -> PortResult<Vec<Review>>;

    // --- Notes ---
    async fn insert_note(&self, note: NewNote) -> PortResult<Note>;

    async fn get_note(&self, note_id: Uuid) -> PortResult<Note>;

    async fn list_notes_by_email(&self, user_email: &str) -> PortResult<Vec<Note>>;

    async fn update_note(
        &self,
        note_id: Uuid,
        title: &str,
        description: &str,
    ) -> PortResult<bool>;

    async fn delete_note(&self, note_id: Uuid) -> PortResult<bool>;
}

#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Creates a payment intent and returns its client secret.
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> PortResult<PaymentIntent>;
}
