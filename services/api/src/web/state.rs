//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use educonnect_core::lifecycle::SessionLifecycle;
use educonnect_core::ports::{DocumentStore, PaymentService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub lifecycle: SessionLifecycle,
    pub payments: Arc<dyn PaymentService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        payments: Arc<dyn PaymentService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            lifecycle: SessionLifecycle::new(store.clone()),
            store,
            payments,
            config,
        }
    }
}
