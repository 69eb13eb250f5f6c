//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DocumentStore` port. Used when no
//! database is configured and by the integration tests. Every operation holds
//! the collection lock for its whole duration, which gives the same
//! per-operation atomicity the Postgres adapter gets from single statements.

use async_trait::async_trait;
use chrono::Utc;
use educonnect_core::domain::{
    BookedSession, Material, NewMaterial, NewNote, NewReview, NewSession, NewUser, Note,
    RegistrationFee, Review, Role, Session, SessionStatus, User, UserCredentials,
};
use educonnect_core::ports::{DocumentStore, PortError, PortResult};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    users: Vec<(User, Option<String>)>,
    sessions: Vec<Session>,
    materials: Vec<Material>,
    booked_sessions: Vec<BookedSession>,
    reviews: Vec<Review>,
    notes: Vec<Note>,
}

/// A `DocumentStore` backed by vectors kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_user_if_absent(&self, user: NewUser) -> PortResult<(User, bool)> {
        let mut db = self.inner.write().await;
        if let Some((existing, _)) = db.users.iter().find(|(u, _)| u.email == user.email) {
            return Ok((existing.clone(), false));
        }
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            photo_url: user.photo_url,
            role: user.role,
            created_at: Utc::now(),
        };
        db.users.push((record.clone(), user.hashed_password));
        Ok((record, true))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let db = self.inner.read().await;
        db.users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(user, hash)| UserCredentials {
                user: user.clone(),
                hashed_password: hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn list_users(&self, search: Option<&str>) -> PortResult<Vec<User>> {
        let db = self.inner.read().await;
        Ok(db
            .users
            .iter()
            .map(|(u, _)| u)
            .filter(|u| match search {
                Some(term) => {
                    contains_ignore_case(&u.email, term)
                        || u.name.as_deref().is_some_and(|n| contains_ignore_case(n, term))
                }
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn list_users_by_role(&self, role: Role) -> PortResult<Vec<User>> {
        let db = self.inner.read().await;
        Ok(db
            .users
            .iter()
            .filter(|(u, _)| u.role == role)
            .map(|(u, _)| u.clone())
            .collect())
    }

    async fn update_user_role(&self, user_id: Uuid, role: Role) -> PortResult<bool> {
        let mut db = self.inner.write().await;
        match db.users.iter_mut().find(|(u, _)| u.id == user_id) {
            Some((user, _)) => {
                user.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_session(&self, session: NewSession) -> PortResult<Session> {
        let session = session.into_session(Uuid::new_v4(), Utc::now());
        self.inner.write().await.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session> {
        self.inner
            .read()
            .await
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }

    async fn list_sessions(&self, offset: u64, limit: u64) -> PortResult<Vec<Session>> {
        let db = self.inner.read().await;
        Ok(db
            .sessions
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_sessions(&self) -> PortResult<u64> {
        Ok(self.inner.read().await.sessions.len() as u64)
    }

    async fn transition_status(
        &self,
        session_id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
    ) -> PortResult<Option<Session>> {
        let mut db = self.inner.write().await;
        Ok(db
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id && s.status == from)
            .map(|s| {
                s.status = to;
                s.clone()
            }))
    }

    async fn set_fee_and_approve(
        &self,
        session_id: Uuid,
        fee: RegistrationFee,
    ) -> PortResult<Option<Session>> {
        let mut db = self.inner.write().await;
        Ok(db.sessions.iter_mut().find(|s| s.id == session_id).map(|s| {
            s.registration_fee = fee;
            s.status = SessionStatus::Approved;
            s.clone()
        }))
    }

    async fn delete_session(&self, session_id: Uuid) -> PortResult<bool> {
        let mut db = self.inner.write().await;
        let before = db.sessions.len();
        db.sessions.retain(|s| s.id != session_id);
        Ok(db.sessions.len() < before)
    }

    async fn insert_material(&self, material: NewMaterial) -> PortResult<Material> {
        let material = Material {
            id: Uuid::new_v4(),
            title: material.title,
            session_id: material.session_id,
            tutor_email: material.tutor_email,
            image: material.image,
            link: material.link,
            uploaded_at: Utc::now(),
        };
        self.inner.write().await.materials.push(material.clone());
        Ok(material)
    }

    async fn get_material(&self, material_id: Uuid) -> PortResult<Material> {
        self.inner
            .read()
            .await
            .materials
            .iter()
            .find(|m| m.id == material_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Material {} not found", material_id)))
    }

    async fn list_materials(&self) -> PortResult<Vec<Material>> {
        Ok(self.inner.read().await.materials.clone())
    }

    async fn list_materials_for_session(&self, session_id: Uuid) -> PortResult<Vec<Material>> {
        let db = self.inner.read().await;
        Ok(db
            .materials
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn list_materials_by_tutor(&self, tutor_email: &str) -> PortResult<Vec<Material>> {
        let db = self.inner.read().await;
        Ok(db
            .materials
            .iter()
            .filter(|m| m.tutor_email == tutor_email)
            .cloned()
            .collect())
    }

    async fn update_material_title(&self, material_id: Uuid, title: &str) -> PortResult<bool> {
        let mut db = self.inner.write().await;
        match db.materials.iter_mut().find(|m| m.id == material_id) {
            Some(material) => {
                material.title = title.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_material(&self, material_id: Uuid) -> PortResult<bool> {
        let mut db = self.inner.write().await;
        let before = db.materials.len();
        db.materials.retain(|m| m.id != material_id);
        Ok(db.materials.len() < before)
    }

    async fn insert_booking(
        &self,
        session: Session,
        student_email: Option<String>,
    ) -> PortResult<BookedSession> {
        let booking = BookedSession {
            id: Uuid::new_v4(),
            session_id: session.id,
            student_email,
            booked_at: Utc::now(),
            snapshot: session,
        };
        self.inner.write().await.booked_sessions.push(booking.clone());
        Ok(booking)
    }

    async fn list_bookings(&self, student_email: Option<&str>) -> PortResult<Vec<BookedSession>> {
        let db = self.inner.read().await;
        Ok(db
            .booked_sessions
            .iter()
            .filter(|b| student_email.is_none() || b.student_email.as_deref() == student_email)
            .cloned()
            .collect())
    }

    async fn insert_review(&self, review: NewReview) -> PortResult<Review> {
        let review = Review {
            id: Uuid::new_v4(),
            session_id: review.session_id,
            student_email: review.student_email,
            rating: review.rating,
            review_text: review.review_text,
            created_at: Utc::now(),
        };
        self.inner.write().await.reviews.push(review.clone());
        Ok(review)
    }

    async fn list_reviews_for_session(&self, session_id: Uuid) -> PortResult<Vec<Review>> {
        let db = self.inner.read().await;
        Ok(db
            .reviews
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn insert_note(&self, note: NewNote) -> PortResult<Note> {
        let note = Note {
            id: Uuid::new_v4(),
            user_email: note.user_email,
            title: note.title,
            description: note.description,
            created_at: Utc::now(),
        };
        self.inner.write().await.notes.push(note.clone());
        Ok(note)
    }

    async fn get_note(&self, note_id: Uuid) -> PortResult<Note> {
        self.inner
            .read()
            .await
            .notes
            .iter()
            .find(|n| n.id == note_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Note {} not found", note_id)))
    }

    async fn list_notes_by_email(&self, user_email: &str) -> PortResult<Vec<Note>> {
        let db = self.inner.read().await;
        Ok(db
            .notes
            .iter()
            .filter(|n| n.user_email == user_email)
            .cloned()
            .collect())
    }

    async fn update_note(
        &self,
        note_id: Uuid,
        title: &str,
        description: &str,
    ) -> PortResult<bool> {
        let mut db = self.inner.write().await;
        match db.notes.iter_mut().find(|n| n.id == note_id) {
            Some(note) => {
                note.title = title.to_string();
                note.description = description.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_note(&self, note_id: Uuid) -> PortResult<bool> {
        let mut db = self.inner.write().await;
        let before = db.notes.len();
        db.notes.retain(|n| n.id != note_id);
        Ok(db.notes.len() < before)
    }
}
