//! Store traits.
//!
//! This module defines the persistence seams of the ordering workflow. The
//! workflow and catalog depend on these traits; the `boxoffice-testing` crate
//! provides in-memory implementations and `boxoffice-postgres` provides the
//! production ones.
//!
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────┐
//! │ OrderWorkflow        │        │ EventCatalog         │
//! │ - create_order       │        │ - listings / search  │
//! │ - status transitions │        │ - admin CRUD         │
//! └──────┬────────┬──────┘        └──────┬────────┬──────┘
//!        │        │                      │        │
//!        ▼        ▼                      ▼        ▼
//! ┌────────────┐ ┌────────────┐ ┌────────────────┐
//! │ Inventory  │ │ Order      │ │ Event          │
//! │ Store      │ │ Ledger     │ │ Repository     │
//! └────────────┘ └────────────┘ └────────────────┘
//! ```
//!
//! Methods return `impl Future + Send` so the workflow stays usable from
//! multi-threaded servers when it is generic over the store.

use crate::error::Result;
use crate::types::{
    Event, EventId, EventQuery, EventUpdate, NewEvent, NewOrder, Order, OrderId, OrderStatus,
    StatusChange, UserId,
};
use std::future::Future;

/// Authoritative capacity and price data per event.
pub trait InventoryStore: Send + Sync {
    /// Get an event by ID.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Event not found → `OrderError::EventNotFound`
    /// - Store fails → `OrderError::StoreFailure`
    fn get(&self, id: EventId) -> impl Future<Output = Result<Event>> + Send;

    /// Reduce availability by `amount`, only if at least `amount` tickets are
    /// available. The check and the write are a single atomic step.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Event not found → `OrderError::EventNotFound`
    /// - Fewer than `amount` tickets left → `OrderError::InsufficientInventory`
    /// - Store fails → `OrderError::StoreFailure`
    fn decrement_availability(
        &self,
        id: EventId,
        amount: u32,
    ) -> impl Future<Output = Result<Event>> + Send;

    /// Increase availability by `amount`, never beyond `total_tickets`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Event not found → `OrderError::EventNotFound`
    /// - Store fails → `OrderError::StoreFailure`
    fn restore_availability(
        &self,
        id: EventId,
        amount: u32,
    ) -> impl Future<Output = Result<Event>> + Send;
}

/// Admin and catalog persistence of event records.
pub trait EventRepository: Send + Sync {
    /// Insert a new event. All tickets start available.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    fn insert(&self, new: NewEvent) -> impl Future<Output = Result<Event>> + Send;

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Event not found → `OrderError::EventNotFound`
    /// - Update is invalid → `OrderError::InvalidEvent`
    /// - Store fails → `OrderError::StoreFailure`
    fn update(&self, id: EventId, update: EventUpdate)
    -> impl Future<Output = Result<Event>> + Send;

    /// Delete an event record.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Event not found → `OrderError::EventNotFound`
    /// - Store fails → `OrderError::StoreFailure`
    fn delete(&self, id: EventId) -> impl Future<Output = Result<()>> + Send;

    /// List events matching a query.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    fn list(&self, query: EventQuery) -> impl Future<Output = Result<Vec<Event>>> + Send;
}

/// Append-mostly record of orders.
pub trait OrderLedger: Send + Sync {
    /// Append an order with a generated ID and creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    fn create(&self, new: NewOrder) -> impl Future<Output = Result<Order>> + Send;

    /// Move an order to `status`, validating the transition against the
    /// current status atomically.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Order not found → `OrderError::OrderNotFound`
    /// - Transition not allowed → `OrderError::InvalidTransition`
    /// - Store fails → `OrderError::StoreFailure`
    fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<StatusChange>> + Send;

    /// Get an order by ID. Ownership is checked by the caller.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Order not found → `OrderError::OrderNotFound`
    /// - Store fails → `OrderError::StoreFailure`
    fn get_by_id(&self, id: OrderId) -> impl Future<Output = Result<Order>> + Send;

    /// Orders owned by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    fn list_by_user(&self, user_id: UserId) -> impl Future<Output = Result<Vec<Order>>> + Send;

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Order>>> + Send;

    /// Physically remove an order that was just created. Only used to roll
    /// back a purchase whose inventory update failed.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Order not found → `OrderError::OrderNotFound`
    /// - Store fails → `OrderError::StoreFailure`
    fn discard(&self, id: OrderId) -> impl Future<Output = Result<()>> + Send;

    /// Number of non-cancelled orders referencing an event.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    fn count_active_for_event(&self, event_id: EventId) -> impl Future<Output = Result<u64>> + Send;

    /// Remove the cancelled orders of an event. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    fn purge_cancelled_for_event(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<u64>> + Send;
}
