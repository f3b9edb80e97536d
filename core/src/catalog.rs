//! Event catalog: public listings and the admin back-office for events.
//!
//! Every mutating operation goes through [`require_admin`].

use crate::error::{OrderError, Result};
use crate::identity::{Identity, require_admin};
use crate::metrics;
use crate::providers::{EventRepository, InventoryStore, OrderLedger};
use crate::types::{Event, EventId, EventQuery, EventSort, EventUpdate, NewEvent, SortOrder};
use std::sync::Arc;

/// Public and administrative access to events.
pub struct EventCatalog<R, L> {
    events: Arc<R>,
    ledger: Arc<L>,
}

impl<R, L> Clone for EventCatalog<R, L> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
            ledger: Arc::clone(&self.ledger),
        }
    }
}

impl<R, L> EventCatalog<R, L>
where
    R: EventRepository + InventoryStore,
    L: OrderLedger,
{
    /// Creates a catalog over an event repository and the order ledger
    /// (consulted before deleting events).
    #[must_use]
    pub const fn new(events: Arc<R>, ledger: Arc<L>) -> Self {
        Self { events, ledger }
    }

    // ═══════════════════════════════════════════════════════════
    // Public
    // ═══════════════════════════════════════════════════════════

    /// Published events matching `query`. Unpublished events are never
    /// returned, whatever the query says.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn list_published(&self, mut query: EventQuery) -> Result<Vec<Event>> {
        query.published_only = true;
        self.events.list(query).await
    }

    /// Featured published events, soonest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn featured(&self) -> Result<Vec<Event>> {
        self.events
            .list(
                EventQuery::published()
                    .featured()
                    .sorted_by(EventSort::StartsAt, SortOrder::Asc),
            )
            .await
    }

    /// Published events whose title or location contains `text`.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn search(&self, text: &str) -> Result<Vec<Event>> {
        self.events.list(EventQuery::published().search(text)).await
    }

    /// A published event.
    ///
    /// # Errors
    ///
    /// [`OrderError::EventNotFound`] if it is missing or unpublished.
    pub async fn get_published(&self, id: EventId) -> Result<Event> {
        let event = self.events.get(id).await?;
        if !event.published {
            return Err(OrderError::EventNotFound(id));
        }
        Ok(event)
    }

    // ═══════════════════════════════════════════════════════════
    // Admin
    // ═══════════════════════════════════════════════════════════

    /// All events matching `query`, published or not.
    ///
    /// # Errors
    ///
    /// Authorization errors from [`require_admin`], or a store failure.
    pub async fn list_all(&self, actor: &impl Identity, query: EventQuery) -> Result<Vec<Event>> {
        require_admin(actor)?;
        self.events.list(query).await
    }

    /// Creates an event with all of its tickets available.
    ///
    /// # Errors
    ///
    /// Authorization errors, [`OrderError::InvalidEvent`] for bad input, or a
    /// store failure.
    #[tracing::instrument(skip_all, fields(title = %new.title))]
    pub async fn create_event(&self, actor: &impl Identity, new: NewEvent) -> Result<Event> {
        let admin_id = require_admin(actor)?;
        new.validate()?;
        let event = self.events.insert(new).await?;
        tracing::info!(
            event_id = %event.id,
            admin_id = %admin_id,
            total_tickets = event.total_tickets,
            "Event created"
        );
        metrics::record_event_created(&event);
        Ok(event)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Authorization errors, [`OrderError::EventNotFound`],
    /// [`OrderError::InvalidEvent`], or a store failure.
    #[tracing::instrument(skip_all, fields(event_id = %id))]
    pub async fn update_event(
        &self,
        actor: &impl Identity,
        id: EventId,
        update: EventUpdate,
    ) -> Result<Event> {
        let admin_id = require_admin(actor)?;
        let event = self.events.update(id, update).await?;
        tracing::info!(event_id = %id, admin_id = %admin_id, "Event updated");
        metrics::record_event_updated(&event);
        Ok(event)
    }

    /// Deletes an event that no active order references. Cancelled orders of
    /// the event are purged first.
    ///
    /// # Errors
    ///
    /// Authorization errors, [`OrderError::EventNotFound`],
    /// [`OrderError::EventInUse`], or a store failure.
    #[tracing::instrument(skip_all, fields(event_id = %id))]
    pub async fn delete_event(&self, actor: &impl Identity, id: EventId) -> Result<()> {
        let admin_id = require_admin(actor)?;
        self.events.get(id).await?;

        let active_orders = self.ledger.count_active_for_event(id).await?;
        if active_orders > 0 {
            tracing::warn!(event_id = %id, active_orders, "Refusing to delete event with active orders");
            return Err(OrderError::EventInUse {
                event_id: id,
                active_orders,
            });
        }

        let purged = self.ledger.purge_cancelled_for_event(id).await?;
        self.events.delete(id).await?;
        tracing::info!(event_id = %id, admin_id = %admin_id, purged, "Event deleted");
        metrics::record_event_deleted(id);
        Ok(())
    }
}
