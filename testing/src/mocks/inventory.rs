//! In-memory event store.

use boxoffice_core::environment::{Clock, SystemClock};
use boxoffice_core::error::{OrderError, Result};
use boxoffice_core::providers::{EventRepository, InventoryStore};
use boxoffice_core::types::{Event, EventId, EventQuery, EventUpdate, NewEvent};
use crate::mocks::InMemoryOrderLedger;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

type Events = Arc<Mutex<HashMap<EventId, Event>>>;
type Injected = Arc<Mutex<Option<OrderError>>>;

fn poisoned<T>(_: T) -> OrderError {
    OrderError::StoreFailure("event store lock poisoned".to_string())
}

/// In-memory event and inventory store.
///
/// Every check-and-write runs under one lock, so the conditional decrement is
/// atomic across concurrent tasks. Failures can be injected for the next
/// decrement or restore to exercise error paths.
///
/// Linked to a ledger with [`with_ledger`](Self::with_ledger), `delete` refuses
/// events that still have active orders, checked under the event lock.
#[derive(Clone)]
pub struct InMemoryInventoryStore {
    events: Events,
    clock: Arc<dyn Clock>,
    ledger: Option<InMemoryOrderLedger>,
    next_decrement_error: Injected,
    next_restore_error: Injected,
}

impl InMemoryInventoryStore {
    /// Create an empty store using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Create an empty store stamping records with `clock`.
    #[must_use]
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            events: Arc::new(Mutex::new(HashMap::new())),
            clock: Arc::new(clock),
            ledger: None,
            next_decrement_error: Arc::new(Mutex::new(None)),
            next_restore_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Refuse to delete events while `ledger` holds active orders for them.
    #[must_use]
    pub fn with_ledger(mut self, ledger: InMemoryOrderLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Seed an event as-is, bypassing validation.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn put(&self, event: Event) -> Result<()> {
        self.events.lock().map_err(poisoned)?.insert(event.id, event);
        Ok(())
    }

    /// Snapshot of an event, if present.
    #[must_use]
    pub fn snapshot(&self, id: EventId) -> Option<Event> {
        self.events.lock().ok()?.get(&id).cloned()
    }

    /// Make the next `decrement_availability` call fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn fail_next_decrement(&self, error: OrderError) -> Result<()> {
        *self.next_decrement_error.lock().map_err(poisoned)? = Some(error);
        Ok(())
    }

    /// Make the next `restore_availability` call fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn fail_next_restore(&self, error: OrderError) -> Result<()> {
        *self.next_restore_error.lock().map_err(poisoned)? = Some(error);
        Ok(())
    }
}

impl Default for InMemoryInventoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn take_injected(slot: &Injected) -> Result<()> {
    match slot.lock().map_err(poisoned)?.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn get(&self, id: EventId) -> impl Future<Output = Result<Event>> + Send {
        let events = Arc::clone(&self.events);

        async move {
            events
                .lock()
                .map_err(poisoned)?
                .get(&id)
                .cloned()
                .ok_or(OrderError::EventNotFound(id))
        }
    }

    fn decrement_availability(
        &self,
        id: EventId,
        amount: u32,
    ) -> impl Future<Output = Result<Event>> + Send {
        let events = Arc::clone(&self.events);
        let injected = Arc::clone(&self.next_decrement_error);

        async move {
            take_injected(&injected)?;

            let mut events = events.lock().map_err(poisoned)?;
            let event = events.get_mut(&id).ok_or(OrderError::EventNotFound(id))?;
            if event.available_tickets < amount {
                return Err(OrderError::InsufficientInventory {
                    requested: amount,
                    available: event.available_tickets,
                });
            }
            event.available_tickets -= amount;
            Ok(event.clone())
        }
    }

    fn restore_availability(
        &self,
        id: EventId,
        amount: u32,
    ) -> impl Future<Output = Result<Event>> + Send {
        let events = Arc::clone(&self.events);
        let injected = Arc::clone(&self.next_restore_error);

        async move {
            take_injected(&injected)?;

            let mut events = events.lock().map_err(poisoned)?;
            let event = events.get_mut(&id).ok_or(OrderError::EventNotFound(id))?;
            let restored = event.available_tickets.saturating_add(amount);
            if restored > event.total_tickets {
                tracing::warn!(
                    event_id = %id,
                    amount,
                    total = event.total_tickets,
                    "Restore would exceed capacity, clamping"
                );
            }
            event.available_tickets = restored.min(event.total_tickets);
            Ok(event.clone())
        }
    }
}

impl EventRepository for InMemoryInventoryStore {
    fn insert(&self, new: NewEvent) -> impl Future<Output = Result<Event>> + Send {
        let events = Arc::clone(&self.events);
        let event = Event::from_new(EventId::new(), new, self.clock.now());

        async move {
            events
                .lock()
                .map_err(poisoned)?
                .insert(event.id, event.clone());
            Ok(event)
        }
    }

    fn update(
        &self,
        id: EventId,
        update: EventUpdate,
    ) -> impl Future<Output = Result<Event>> + Send {
        let events = Arc::clone(&self.events);

        async move {
            let mut events = events.lock().map_err(poisoned)?;
            let event = events.get_mut(&id).ok_or(OrderError::EventNotFound(id))?;
            update.apply_to(event)?;
            Ok(event.clone())
        }
    }

    fn delete(&self, id: EventId) -> impl Future<Output = Result<()>> + Send {
        let events = Arc::clone(&self.events);
        let ledger = self.ledger.clone();

        async move {
            // Lock order: events, then orders. A purchase records its order
            // before decrementing, so a sale that already took tickets is seen here.
            let mut events = events.lock().map_err(poisoned)?;
            if !events.contains_key(&id) {
                return Err(OrderError::EventNotFound(id));
            }
            if let Some(ledger) = ledger {
                let active_orders = ledger.active_orders_for(id)?;
                if active_orders > 0 {
                    return Err(OrderError::EventInUse {
                        event_id: id,
                        active_orders,
                    });
                }
            }
            events.remove(&id);
            Ok(())
        }
    }

    fn list(&self, query: EventQuery) -> impl Future<Output = Result<Vec<Event>>> + Send {
        let events = Arc::clone(&self.events);

        async move {
            let snapshot: Vec<Event> = events.lock().map_err(poisoned)?.values().cloned().collect();
            Ok(query.apply(snapshot))
        }
    }
}
