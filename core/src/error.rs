//! Error types for ticket ordering and catalog operations.

use crate::types::{EventId, OrderId, OrderStatus};
use thiserror::Error;

/// Result type alias for boxoffice operations.
pub type Result<T> = std::result::Result<T, OrderError>;

/// Every way an ordering or catalog operation can fail.
///
/// The set is closed so callers can branch exhaustively instead of matching on
/// messages. Store implementations map their own failures into
/// [`OrderError::StoreFailure`], keeping the underlying message verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    // ═══════════════════════════════════════════════════════════
    // Identity
    // ═══════════════════════════════════════════════════════════

    /// The actor is not logged in.
    #[error("Please login to continue")]
    Unauthenticated,

    /// The actor is logged in but may not perform this operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // ═══════════════════════════════════════════════════════════
    // Order validation
    // ═══════════════════════════════════════════════════════════

    /// Quantity is not a positive integer (or the total overflows).
    #[error("Invalid ticket quantity: {quantity}")]
    InvalidQuantity {
        /// Requested quantity
        quantity: i64,
    },

    /// Quantity is above the per-order maximum.
    #[error("Cannot purchase more than {limit} tickets per order (requested {requested})")]
    QuantityExceedsLimit {
        /// Requested quantity
        requested: i64,
        /// Configured maximum
        limit: u32,
    },

    /// Not enough tickets left.
    #[error("Insufficient inventory: requested {requested}, only {available} available")]
    InsufficientInventory {
        /// Requested quantity
        requested: u32,
        /// Tickets available at the time of the check
        available: u32,
    },

    /// The requested status change is not allowed by the order state machine.
    #[error("Invalid order status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: OrderStatus,
        /// Requested status
        to: OrderStatus,
    },

    // ═══════════════════════════════════════════════════════════
    // Lookups
    // ═══════════════════════════════════════════════════════════

    /// Event does not exist (or is not visible to the actor).
    #[error("Event {0} not found")]
    EventNotFound(EventId),

    /// Order does not exist.
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),

    // ═══════════════════════════════════════════════════════════
    // Catalog administration
    // ═══════════════════════════════════════════════════════════

    /// Admin input for an event is invalid.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Event cannot be deleted while non-cancelled orders reference it.
    #[error("Event {event_id} still has {active_orders} active orders")]
    EventInUse {
        /// Event that was to be deleted
        event_id: EventId,
        /// Number of non-cancelled orders
        active_orders: u64,
    },

    // ═══════════════════════════════════════════════════════════
    // System
    // ═══════════════════════════════════════════════════════════

    /// Underlying persistence failed.
    #[error("Store failure: {0}")]
    StoreFailure(String),
}

impl OrderError {
    /// Returns `true` if this error is caused by the caller's input or
    /// identity rather than by the system.
    ///
    /// # Examples
    ///
    /// ```
    /// # use boxoffice_core::OrderError;
    /// assert!(OrderError::Unauthenticated.is_user_error());
    /// assert!(!OrderError::StoreFailure("timeout".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(self, Self::StoreFailure(_))
    }

    /// Returns `true` if a lookup failed.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::EventNotFound(_) | Self::OrderNotFound(_))
    }

    /// Short stable label, used for metrics and log fields.
    ///
    /// # Examples
    ///
    /// ```
    /// # use boxoffice_core::OrderError;
    /// assert_eq!(OrderError::Unauthenticated.kind(), "unauthenticated");
    /// ```
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::QuantityExceedsLimit { .. } => "quantity_exceeds_limit",
            Self::InsufficientInventory { .. } => "insufficient_inventory",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::EventNotFound(_) => "event_not_found",
            Self::OrderNotFound(_) => "order_not_found",
            Self::InvalidEvent(_) => "invalid_event",
            Self::EventInUse { .. } => "event_in_use",
            Self::StoreFailure(_) => "store_failure",
        }
    }
}
