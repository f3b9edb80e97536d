//! Shared application state.

use crate::session::SessionDirectory;
use axum::extract::FromRef;
use boxoffice_core::{
    EventCatalog, EventRepository, InventoryStore, OrderLedger, OrderPolicy, OrderWorkflow,
};
use std::sync::Arc;

/// State shared by every handler.
///
/// Generic over the stores so the same router serves `PostgreSQL` in
/// production and the in-memory stores in tests.
pub struct AppState<R, L> {
    /// Purchases and order status changes
    pub workflow: OrderWorkflow<R, L>,
    /// Public listings and admin event CRUD
    pub catalog: EventCatalog<R, L>,
    /// Bearer token table
    pub sessions: Arc<SessionDirectory>,
}

impl<R, L> Clone for AppState<R, L> {
    fn clone(&self) -> Self {
        Self {
            workflow: self.workflow.clone(),
            catalog: self.catalog.clone(),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<R, L> AppState<R, L>
where
    R: EventRepository + InventoryStore,
    L: OrderLedger,
{
    /// Wire the workflow and catalog over one event store and one ledger.
    #[must_use]
    pub fn new(
        events: Arc<R>,
        ledger: Arc<L>,
        policy: OrderPolicy,
        sessions: SessionDirectory,
    ) -> Self {
        Self {
            workflow: OrderWorkflow::new(Arc::clone(&events), Arc::clone(&ledger), policy),
            catalog: EventCatalog::new(events, ledger),
            sessions: Arc::new(sessions),
        }
    }
}

impl<R, L> FromRef<AppState<R, L>> for Arc<SessionDirectory> {
    fn from_ref(state: &AppState<R, L>) -> Self {
        Arc::clone(&state.sessions)
    }
}
