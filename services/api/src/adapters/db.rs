//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use educonnect_core::domain::{
    BookedSession, Material, NewMaterial, NewNote, NewReview, NewSession, NewUser, Note,
    RegistrationFee, Review, Role, Session, SessionStatus, User, UserCredentials,
};
use educonnect_core::ports::{DocumentStore, PortError, PortResult};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, photo_url, role, password_hash, created_at";
const SESSION_COLUMNS: &str = "id, title, tutor_name, tutor_email, description, \
    registration_start_date, registration_end_date, class_start_date, class_end_date, \
    duration, image, status, registration_fee, created_at";
const MATERIAL_COLUMNS: &str = "id, title, session_id, tutor_email, image, link, uploaded_at";
const BOOKING_COLUMNS: &str = "id, session_id, student_email, snapshot, booked_at";
const REVIEW_COLUMNS: &str = "id, session_id, student_email, rating, review_text, created_at";
const NOTE_COLUMNS: &str = "id, user_email, title, description, created_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    timeout: Duration,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`. Every query is abandoned after `timeout`.
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Runs a query under the outbound timeout and maps its error.
    async fn timed<T, F>(&self, query: F) -> PortResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => result.map_err(map_sqlx_error),
            Err(_) => Err(PortError::Unavailable(format!(
                "database call exceeded {:?}",
                self.timeout
            ))),
        }
    }
}

fn map_sqlx_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound("Row not found".to_string()),
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => PortError::Unavailable(e.to_string()),
        _ => PortError::Unexpected(e.to_string()),
    }
}

/// Escapes `LIKE` metacharacters and wraps the term for a substring match.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: Option<String>,
    email: String,
    photo_url: Option<String>,
    role: String,
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<UserCredentials> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(UserCredentials {
            user: User {
                id: self.id,
                name: self.name,
                email: self.email,
                photo_url: self.photo_url,
                role,
                created_at: self.created_at,
            },
            hashed_password: self.password_hash,
        })
    }

    fn to_user(self) -> PortResult<User> {
        self.to_domain().map(|creds| creds.user)
    }
}

/// Also the JSON shape of the session copy kept in `booked_sessions.snapshot`.
#[derive(FromRow, Serialize, Deserialize)]
struct SessionRecord {
    id: Uuid,
    title: String,
    tutor_name: String,
    tutor_email: String,
    description: String,
    registration_start_date: String,
    registration_end_date: String,
    class_start_date: String,
    class_end_date: String,
    duration: String,
    image: Option<String>,
    status: String,
    registration_fee: f64,
    created_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> PortResult<Session> {
        let status = self
            .status
            .parse::<SessionStatus>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let registration_fee = RegistrationFee::new(self.registration_fee)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Session {
            id: self.id,
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
            status,
            registration_fee,
            created_at: self.created_at,
        })
    }
}
impl From<&Session> for SessionRecord {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id,
            title: s.title.clone(),
            tutor_name: s.tutor_name.clone(),
            tutor_email: s.tutor_email.clone(),
            description: s.description.clone(),
            registration_start_date: s.registration_start_date.clone(),
            registration_end_date: s.registration_end_date.clone(),
            class_start_date: s.class_start_date.clone(),
            class_end_date: s.class_end_date.clone(),
            duration: s.duration.clone(),
            image: s.image.clone(),
            status: s.status.as_str().to_string(),
            registration_fee: s.registration_fee.amount(),
            created_at: s.created_at,
        }
    }
}

fn sessions_to_domain(records: Vec<SessionRecord>) -> PortResult<Vec<Session>> {
    records.into_iter().map(SessionRecord::to_domain).collect()
}

#[derive(FromRow)]
struct MaterialRecord {
    id: Uuid,
    title: String,
    session_id: Uuid,
    tutor_email: String,
    image: Option<String>,
    link: Option<String>,
    uploaded_at: DateTime<Utc>,
}
impl MaterialRecord {
    fn to_domain(self) -> Material {
        Material {
            id: self.id,
            title: self.title,
            session_id: self.session_id,
            tutor_email: self.tutor_email,
            image: self.image,
            link: self.link,
            uploaded_at: self.uploaded_at,
        }
    }
}

#[derive(FromRow)]
struct BookingRecord {
    id: Uuid,
    session_id: Uuid,
    student_email: Option<String>,
    snapshot: Json<SessionRecord>,
    booked_at: DateTime<Utc>,
}
impl BookingRecord {
    fn to_domain(self) -> PortResult<BookedSession> {
        Ok(BookedSession {
            id: self.id,
            session_id: self.session_id,
            student_email: self.student_email,
            booked_at: self.booked_at,
            snapshot: self.snapshot.0.to_domain()?,
        })
    }
}

#[derive(FromRow)]
struct ReviewRecord {
    id: Uuid,
    session_id: Uuid,
    student_email: Option<String>,
    rating: i16,
    review_text: String,
    created_at: DateTime<Utc>,
}
impl ReviewRecord {
    fn to_domain(self) -> PortResult<Review> {
        let rating = u8::try_from(self.rating)
            .map_err(|_| PortError::Unexpected(format!("invalid stored rating {}", self.rating)))?;
        Ok(Review {
            id: self.id,
            session_id: self.session_id,
            student_email: self.student_email,
            rating,
            review_text: self.review_text,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct NoteRecord {
    id: Uuid,
    user_email: String,
    title: String,
    description: String,
    created_at: DateTime<Utc>,
}
impl NoteRecord {
    fn to_domain(self) -> Note {
        Note {
            id: self.id,
            user_email: self.user_email,
            title: self.title,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for DbAdapter {
    async fn insert_user_if_absent(&self, user: NewUser) -> PortResult<(User, bool)> {
        let insert = format!(
            "INSERT INTO users (id, name, email, photo_url, role, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (email) DO NOTHING RETURNING {USER_COLUMNS}"
        );
        let inserted = self
            .timed(
                sqlx::query_as::<_, UserRecord>(&insert)
                    .bind(Uuid::new_v4())
                    .bind(&user.name)
                    .bind(&user.email)
                    .bind(&user.photo_url)
                    .bind(user.role.as_str())
                    .bind(&user.hashed_password)
                    .fetch_optional(&self.pool),
            )
            .await?;

        match inserted {
            Some(record) => Ok((record.to_user()?, true)),
            None => {
                let existing = self.get_user_by_email(&user.email).await?;
                Ok((existing.user, false))
            }
        }
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        self.timed(
            sqlx::query_as::<_, UserRecord>(&sql)
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))?
        .to_domain()
    }

    async fn list_users(&self, search: Option<&str>) -> PortResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE $1::text IS NULL OR name ILIKE $1 OR email ILIKE $1 \
             ORDER BY created_at, id"
        );
        let records = self
            .timed(
                sqlx::query_as::<_, UserRecord>(&sql)
                    .bind(search.map(like_pattern))
                    .fetch_all(&self.pool),
            )
            .await?;
        records.into_iter().map(UserRecord::to_user).collect()
    }

    async fn list_users_by_role(&self, role: Role) -> PortResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY created_at, id"
        );
        let records = self
            .timed(
                sqlx::query_as::<_, UserRecord>(&sql)
                    .bind(role.as_str())
                    .fetch_all(&self.pool),
            )
            .await?;
        records.into_iter().map(UserRecord::to_user).collect()
    }

    async fn update_user_role(&self, user_id: Uuid, role: Role) -> PortResult<bool> {
        let result = self
            .timed(
                sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
                    .bind(role.as_str())
                    .bind(user_id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_session(&self, session: NewSession) -> PortResult<Session> {
        let session = session.into_session(Uuid::new_v4(), Utc::now());
        let record = SessionRecord::from(&session);
        let sql = format!(
            "INSERT INTO sessions ({SESSION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {SESSION_COLUMNS}"
        );
        self.timed(
            sqlx::query_as::<_, SessionRecord>(&sql)
                .bind(record.id)
                .bind(&record.title)
                .bind(&record.tutor_name)
                .bind(&record.tutor_email)
                .bind(&record.description)
                .bind(&record.registration_start_date)
                .bind(&record.registration_end_date)
                .bind(&record.class_start_date)
                .bind(&record.class_end_date)
                .bind(&record.duration)
                .bind(&record.image)
                .bind(&record.status)
                .bind(record.registration_fee)
                .bind(record.created_at)
                .fetch_one(&self.pool),
        )
        .await?
        .to_domain()
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1");
        self.timed(
            sqlx::query_as::<_, SessionRecord>(&sql)
                .bind(session_id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?
        .to_domain()
    }

    async fn list_sessions(&self, offset: u64, limit: u64) -> PortResult<Vec<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions ORDER BY created_at, id OFFSET $1 LIMIT $2"
        );
        let records = self
            .timed(
                sqlx::query_as::<_, SessionRecord>(&sql)
                    .bind(i64::try_from(offset).unwrap_or(i64::MAX))
                    .bind(i64::try_from(limit).unwrap_or(i64::MAX))
                    .fetch_all(&self.pool),
            )
            .await?;
        sessions_to_domain(records)
    }

    async fn count_sessions(&self) -> PortResult<u64> {
        let count = self
            .timed(
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sessions")
                    .fetch_one(&self.pool),
            )
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn transition_status(
        &self,
        session_id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
    ) -> PortResult<Option<Session>> {
        let sql = format!(
            "UPDATE sessions SET status = $1 WHERE id = $2 AND status = $3 \
             RETURNING {SESSION_COLUMNS}"
        );
        self.timed(
            sqlx::query_as::<_, SessionRecord>(&sql)
                .bind(to.as_str())
                .bind(session_id)
                .bind(from.as_str())
                .fetch_optional(&self.pool),
        )
        .await?
        .map(SessionRecord::to_domain)
        .transpose()
    }

    async fn set_fee_and_approve(
        &self,
        session_id: Uuid,
        fee: RegistrationFee,
    ) -> PortResult<Option<Session>> {
        let sql = format!(
            "UPDATE sessions SET registration_fee = $1, status = $2 WHERE id = $3 \
             RETURNING {SESSION_COLUMNS}"
        );
        self.timed(
            sqlx::query_as::<_, SessionRecord>(&sql)
                .bind(fee.amount())
                .bind(SessionStatus::Approved.as_str())
                .bind(session_id)
                .fetch_optional(&self.pool),
        )
        .await?
        .map(SessionRecord::to_domain)
        .transpose()
    }

    async fn delete_session(&self, session_id: Uuid) -> PortResult<bool> {
        let result = self
            .timed(
                sqlx::query("DELETE FROM sessions WHERE id = $1")
                    .bind(session_id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_material(&self, material: NewMaterial) -> PortResult<Material> {
        let sql = format!(
            "INSERT INTO materials (id, title, session_id, tutor_email, image, link) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {MATERIAL_COLUMNS}"
        );
        let record = self
            .timed(
                sqlx::query_as::<_, MaterialRecord>(&sql)
                    .bind(Uuid::new_v4())
                    .bind(&material.title)
                    .bind(material.session_id)
                    .bind(&material.tutor_email)
                    .bind(&material.image)
                    .bind(&material.link)
                    .fetch_one(&self.pool),
            )
            .await?;
        Ok(record.to_domain())
    }

    async fn get_material(&self, material_id: Uuid) -> PortResult<Material> {
        let sql = format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = $1");
        let record = self
            .timed(
                sqlx::query_as::<_, MaterialRecord>(&sql)
                    .bind(material_id)
                    .fetch_optional(&self.pool),
            )
            .await?
            .ok_or_else(|| PortError::NotFound(format!("Material {} not found", material_id)))?;
        Ok(record.to_domain())
    }

    async fn list_materials(&self) -> PortResult<Vec<Material>> {
        let sql = format!("SELECT {MATERIAL_COLUMNS} FROM materials ORDER BY uploaded_at, id");
        let records = self
            .timed(sqlx::query_as::<_, MaterialRecord>(&sql).fetch_all(&self.pool))
            .await?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_materials_for_session(&self, session_id: Uuid) -> PortResult<Vec<Material>> {
        let sql = format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE session_id = $1 \
             ORDER BY uploaded_at, id"
        );
        let records = self
            .timed(
                sqlx::query_as::<_, MaterialRecord>(&sql)
                    .bind(session_id)
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_materials_by_tutor(&self, tutor_email: &str) -> PortResult<Vec<Material>> {
        let sql = format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE tutor_email = $1 \
             ORDER BY uploaded_at, id"
        );
        let records = self
            .timed(
                sqlx::query_as::<_, MaterialRecord>(&sql)
                    .bind(tutor_email)
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_material_title(&self, material_id: Uuid, title: &str) -> PortResult<bool> {
        let result = self
            .timed(
                sqlx::query("UPDATE materials SET title = $1 WHERE id = $2")
                    .bind(title)
                    .bind(material_id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_material(&self, material_id: Uuid) -> PortResult<bool> {
        let result = self
            .timed(
                sqlx::query("DELETE FROM materials WHERE id = $1")
                    .bind(material_id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_booking(
        &self,
        session: Session,
        student_email: Option<String>,
    ) -> PortResult<BookedSession> {
        let sql = format!(
            "INSERT INTO booked_sessions (id, session_id, student_email, snapshot) \
             VALUES ($1, $2, $3, $4) RETURNING {BOOKING_COLUMNS}"
        );
        self.timed(
            sqlx::query_as::<_, BookingRecord>(&sql)
                .bind(Uuid::new_v4())
                .bind(session.id)
                .bind(&student_email)
                .bind(Json(SessionRecord::from(&session)))
                .fetch_one(&self.pool),
        )
        .await?
        .to_domain()
    }

    async fn list_bookings(&self, student_email: Option<&str>) -> PortResult<Vec<BookedSession>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM booked_sessions \
             WHERE $1::text IS NULL OR student_email = $1 ORDER BY booked_at, id"
        );
        let records = self
            .timed(
                sqlx::query_as::<_, BookingRecord>(&sql)
                    .bind(student_email)
                    .fetch_all(&self.pool),
            )
            .await?;
        records.into_iter().map(BookingRecord::to_domain).collect()
    }

    async fn insert_review(&self, review: NewReview) -> PortResult<Review> {
        let sql = format!(
            "INSERT INTO reviews (id, session_id, student_email, rating, review_text) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {REVIEW_COLUMNS}"
        );
        self.timed(
            sqlx::query_as::<_, ReviewRecord>(&sql)
                .bind(Uuid::new_v4())
                .bind(review.session_id)
                .bind(&review.student_email)
                .bind(i16::from(review.rating))
                .bind(&review.review_text)
                .fetch_one(&self.pool),
        )
        .await?
        .to_domain()
    }

    async fn list_reviews_for_session(&self, session_id: Uuid) -> PortResult<Vec<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE session_id = $1 ORDER BY created_at, id"
        );
        let records = self
            .timed(
                sqlx::query_as::<_, ReviewRecord>(&sql)
                    .bind(session_id)
                    .fetch_all(&self.pool),
            )
            .await?;
        records.into_iter().map(ReviewRecord::to_domain).collect()
    }

    async fn insert_note(&self, note: NewNote) -> PortResult<Note> {
        let sql = format!(
            "INSERT INTO notes (id, user_email, title, description) \
             VALUES ($1, $2, $3, $4) RETURNING {NOTE_COLUMNS}"
        );
        let record = self
            .timed(
                sqlx::query_as::<_, NoteRecord>(&sql)
                    .bind(Uuid::new_v4())
                    .bind(&note.user_email)
                    .bind(&note.title)
                    .bind(&note.description)
                    .fetch_one(&self.pool),
            )
            .await?;
        Ok(record.to_domain())
    }

    async fn get_note(&self, note_id: Uuid) -> PortResult<Note> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1");
        let record = self
            .timed(
                sqlx::query_as::<_, NoteRecord>(&sql)
                    .bind(note_id)
                    .fetch_optional(&self.pool),
            )
            .await?
            .ok_or_else(|| PortError::NotFound(format!("Note {} not found", note_id)))?;
        Ok(record.to_domain())
    }

    async fn list_notes_by_email(&self, user_email: &str) -> PortResult<Vec<Note>> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE user_email = $1 ORDER BY created_at, id"
        );
        let records = self
            .timed(
                sqlx::query_as::<_, NoteRecord>(&sql)
                    .bind(user_email)
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_note(
        &self,
        note_id: Uuid,
        title: &str,
        description: &str,
    ) -> PortResult<bool> {
        let result = self
            .timed(
                sqlx::query("UPDATE notes SET title = $1, description = $2 WHERE id = $3")
                    .bind(title)
                    .bind(description)
                    .bind(note_id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_note(&self, note_id: Uuid) -> PortResult<bool> {
        let result = self
            .timed(
                sqlx::query("DELETE FROM notes WHERE id = $1")
                    .bind(note_id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
