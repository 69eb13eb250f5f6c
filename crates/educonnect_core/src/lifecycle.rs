//! crates/educonnect_core/src/lifecycle.rs
//!
//! The study-session state machine. Guarded transitions are delegated to the
//! store as a single conditional update, so two concurrent requests can never
//! both apply a transition from the same pre-state.

use crate::domain::{NewSession, RegistrationFee, Session, SessionStatus};
use crate::pagination::{Page, PageRequest};
use crate::ports::{DocumentStore, PortError, PortResult};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// A guarded status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Reject,
    ApprovePaid,
    ApproveFree,
    Unreject,
    RevertApproval,
}

impl Transition {
    /// The status the session must be in for the transition to apply.
    pub fn guard(&self) -> SessionStatus {
        match self {
            Transition::Reject | Transition::ApprovePaid | Transition::ApproveFree => {
                SessionStatus::Pending
            }
            Transition::Unreject => SessionStatus::Rejected,
            Transition::RevertApproval => SessionStatus::Approved,
        }
    }

    pub fn target(&self) -> SessionStatus {
        match self {
            Transition::Reject => SessionStatus::Rejected,
            Transition::ApprovePaid | Transition::ApproveFree => SessionStatus::Approved,
            Transition::Unreject | Transition::RevertApproval => SessionStatus::Pending,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transition::Reject => "reject",
            Transition::ApprovePaid => "approve-paid",
            Transition::ApproveFree => "approve-free",
            Transition::Unreject => "unreject",
            Transition::RevertApproval => "revert-approval",
        }
    }
}

/// Result of a lifecycle operation. `applied == false` means the guard did not
/// match and nothing was written; `session` then holds the current document.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub applied: bool,
    pub session: Session,
}

impl TransitionOutcome {
    pub fn current_status(&self) -> SessionStatus {
        self.session.status
    }
}

/// Owns every write to a session's `status` and `registration_fee`.
#[derive(Clone)]
pub struct SessionLifecycle {
    store: Arc<dyn DocumentStore>,
}

impl SessionLifecycle {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates a session in the `pending` state with no fee.
    pub async fn create(&self, new_session: NewSession) -> PortResult<Session> {
        let session = self.store.insert_session(new_session).await?;
        info!(session_id = %session.id, tutor = %session.tutor_email, "session created");
        Ok(session)
    }

    pub async fn get(&self, session_id: Uuid) -> PortResult<Session> {
        self.store.get_session(session_id).await
    }

    pub async fn page(&self, request: PageRequest) -> PortResult<Page<Session>> {
        let total = self.store.count_sessions().await?;
        let items = self
            .store
            .list_sessions(request.offset(), request.limit())
            .await?;
        Ok(Page {
            items,
            total,
            request,
        })
    }

    pub async fn all(&self) -> PortResult<Vec<Session>> {
        let total = self.store.count_sessions().await?;
        self.store.list_sessions(0, total).await
    }

    /// Applies a guarded transition.
    pub async fn apply(
        &self,
        session_id: Uuid,
        transition: Transition,
    ) -> PortResult<TransitionOutcome> {
        let updated = self
            .store
            .transition_status(session_id, transition.guard(), transition.target())
            .await?;

        if let Some(session) = updated {
            info!(
                %session_id,
                transition = transition.name(),
                status = %session.status,
                "session transition applied"
            );
            return Ok(TransitionOutcome {
                applied: true,
                session,
            });
        }

        // Nothing matched: either the session is gone or the guard failed.
        let session = self.store.get_session(session_id).await?;
        debug!(
            %session_id,
            transition = transition.name(),
            expected = %transition.guard(),
            current = %session.status,
            "session transition skipped"
        );
        Ok(TransitionOutcome {
            applied: false,
            session,
        })
    }

    pub async fn reject(&self, session_id: Uuid) -> PortResult<TransitionOutcome> {
        self.apply(session_id, Transition::Reject).await
    }

    pub async fn approve_paid(&self, session_id: Uuid) -> PortResult<TransitionOutcome> {
        self.apply(session_id, Transition::ApprovePaid).await
    }

    pub async fn approve_free(&self, session_id: Uuid) -> PortResult<TransitionOutcome> {
        self.apply(session_id, Transition::ApproveFree).await
    }

    pub async fn unreject(&self, session_id: Uuid) -> PortResult<TransitionOutcome> {
        self.apply(session_id, Transition::Unreject).await
    }

    pub async fn revert_approval(&self, session_id: Uuid) -> PortResult<TransitionOutcome> {
        self.apply(session_id, Transition::RevertApproval).await
    }

    /// Sets the fee and approves, whatever the current status.
    pub async fn set_fee_and_approve(
        &self,
        session_id: Uuid,
        fee: RegistrationFee,
    ) -> PortResult<TransitionOutcome> {
        let session = self
            .store
            .set_fee_and_approve(session_id, fee)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;
        info!(%session_id, fee = fee.amount(), "session fee set and approved");
        Ok(TransitionOutcome {
            applied: true,
            session,
        })
    }

    /// Permanently removes the session.
    pub async fn delete(&self, session_id: Uuid) -> PortResult<()> {
        if !self.store.delete_session(session_id).await? {
            return Err(PortError::NotFound(format!("Session {} not found", session_id)));
        }
        info!(%session_id, "session deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Transition; 5] = [
        Transition::Reject,
        Transition::ApprovePaid,
        Transition::ApproveFree,
        Transition::Unreject,
        Transition::RevertApproval,
    ];

    #[test]
    fn transition_table() {
        use SessionStatus::*;
        let table: Vec<_> = ALL.iter().map(|t| (t.guard(), t.target())).collect();
        assert_eq!(
            table,
            vec![
                (Pending, Rejected),
                (Pending, Approved),
                (Pending, Approved),
                (Rejected, Pending),
                (Approved, Pending),
            ]
        );
    }

    #[test]
    fn no_transition_is_a_self_loop() {
        for t in ALL {
            assert_ne!(t.guard(), t.target(), "{}", t.name());
        }
    }
}
