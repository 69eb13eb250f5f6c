//! crates/educonnect_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Users
//=========================================================================================

/// The dashboard a user is allowed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Admin,
    Tutor,
    #[default]
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Tutor => "tutor",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "tutor" => Ok(Role::Tutor),
            "student" => Ok(Role::Student),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub photo_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    /// `None` for accounts created through a social provider.
    pub hashed_password: Option<String>,
}

/// Everything needed to insert a user record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: String,
    pub photo_url: Option<String>,
    pub role: Role,
    pub hashed_password: Option<String>,
}

//=========================================================================================
// Study sessions
//=========================================================================================

/// Lifecycle status of a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SessionStatus {
    /// Status every session is created with.
    pub const INITIAL: SessionStatus = SessionStatus::Pending;

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Approved => "approved",
            SessionStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown session status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for SessionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "approved" => Ok(SessionStatus::Approved),
            "rejected" => Ok(SessionStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A registration fee in major currency units. Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct RegistrationFee(f64);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidFee {
    #[error("registration fee must be a number, got '{0}'")]
    NotANumber(String),
    #[error("registration fee must be finite and non-negative, got {0}")]
    OutOfRange(f64),
}

impl RegistrationFee {
    pub const FREE: RegistrationFee = RegistrationFee(0.0);

    pub fn new(amount: f64) -> Result<Self, InvalidFee> {
        if amount.is_finite() && amount >= 0.0 {
            // Normalise -0.0 so stored documents never carry a signed zero.
            Ok(Self(amount.abs()))
        } else {
            Err(InvalidFee::OutOfRange(amount))
        }
    }

    pub fn amount(&self) -> f64 {
        self.0
    }
}

impl FromStr for RegistrationFee {
    type Err = InvalidFee;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s
            .trim()
            .parse::<f64>()
            .map_err(|_| InvalidFee::NotANumber(s.to_string()))?;
        Self::new(amount)
    }
}

/// A tutoring class instance with a lifecycle status and fee.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
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
    pub status: SessionStatus,
    pub registration_fee: RegistrationFee,
    pub created_at: DateTime<Utc>,
}

/// The tutor-supplied part of a session. Status and fee are never accepted
/// from the caller; stores write `SessionStatus::INITIAL` and a free fee.
#[derive(Debug, Clone, Default)]
pub struct NewSession {
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
}

impl NewSession {
    /// Materialises the initial document for this session.
    pub fn into_session(self, id: Uuid, created_at: DateTime<Utc>) -> Session {
        Session {
            id,
            title: self.title,
            tutor_name: self.tutor_name,
            tutor_email: self.tutor_email,
            description: self.description,
            registration_start_date: self.registration_start_date,
            registration_end_date: self.registration_end_date,
            class_start_date: self.class_start_date,
            class_end_date: self.class_end_date,
            duration: self.duration,
            image: self.image,
            status: SessionStatus::INITIAL,
            registration_fee: RegistrationFee::FREE,
            created_at,
        }
    }
}

//=========================================================================================
// Materials, bookings, reviews and notes
//=========================================================================================

/// Study material a tutor attached to a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: Uuid,
    pub title: String,
    pub session_id: Uuid,
    pub tutor_email: String,
    pub image: Option<String>,
    pub link: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub title: String,
    pub session_id: Uuid,
    pub tutor_email: String,
    pub image: Option<String>,
    pub link: Option<String>,
}

/// A booking keeps a copy of the session as it was when booked. Later edits
/// to the session do not reach existing bookings.
#[derive(Debug, Clone, PartialEq)]
pub struct BookedSession {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_email: Option<String>,
    pub booked_at: DateTime<Utc>,
    pub snapshot: Session,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_email: Option<String>,
    pub rating: u8,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub session_id: Uuid,
    pub student_email: Option<String>,
    pub rating: u8,
    pub review_text: String,
}

/// A student's personal note.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: Uuid,
    pub user_email: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub user_email: String,
    pub title: String,
    pub description: String,
}

//=========================================================================================
// Payments
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid positive price")]
pub struct InvalidPrice(pub String);

/// Converts a price in major units to minor units, truncating anything past
/// the second decimal place. Works on the decimal text so `12.99` is exactly
/// `1299`.
pub fn price_to_minor_units(price: &str) -> Result<i64, InvalidPrice> {
    let invalid = || InvalidPrice(price.to_string());
    let trimmed = price.trim();
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let cents: i64 = fraction
        .chars()
        .chain(std::iter::repeat('0'))
        .take(2)
        .collect::<String>()
        .parse()
        .map_err(|_| invalid())?;

    let amount = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(cents))
        .ok_or_else(invalid)?;
    if amount == 0 {
        return Err(invalid());
    }
    Ok(amount)
}

/// What the payment processor is asked to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    pub amount_minor: i64,
    pub currency: String,
    /// Sent to the processor so client retries do not charge twice.
    pub idempotency_key: Option<String>,
}

impl PaymentIntentRequest {
    /// Key used to de-duplicate retries of the same student paying the same
    /// amount for the same session. A changed fee yields a new key.
    pub fn idempotency_key_for(session_id: Uuid, payer_email: &str, amount_minor: i64) -> String {
        format!(
            "payment-intent:{}:{}:{}",
            session_id,
            payer_email.to_ascii_lowercase(),
            amount_minor
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}
