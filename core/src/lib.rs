//! # Boxoffice Core
//!
//! Domain types, store traits and the order workflow for the boxoffice
//! event-ticketing backend.
//!
//! ## Core Concepts
//!
//! - **Event**: an event on sale, doubling as its ticket inventory record
//! - **Order**: a purchase of tickets for one event, with a status
//! - **Stores**: [`InventoryStore`], [`EventRepository`] and [`OrderLedger`],
//!   implemented in memory by `boxoffice-testing` and on `PostgreSQL` by
//!   `boxoffice-postgres`
//! - **Workflow**: [`OrderWorkflow`] runs purchases and status changes
//! - **Catalog**: [`EventCatalog`] serves public listings and admin event CRUD
//! - **Identity**: [`Identity`] is all the workflow knows about the caller
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_core::*;
//!
//! let workflow = OrderWorkflow::new(inventory, ledger, OrderPolicy::default());
//!
//! let order = workflow
//!     .create_order(&Actor::user(user_id), event_id, 3)
//!     .await?;
//! assert_eq!(order.status, OrderStatus::Pending);
//!
//! workflow.cancel_order(&Actor::user(user_id), order.id).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod environment;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod providers;
pub mod types;
pub mod workflow;

pub use catalog::EventCatalog;
pub use environment::{Clock, SystemClock};
pub use error::{OrderError, Result};
pub use identity::{Actor, Identity, Role, require_admin, require_authenticated, require_owner_or_admin};
pub use providers::{EventRepository, InventoryStore, OrderLedger};
pub use types::{
    Event, EventId, EventQuery, EventSort, EventUpdate, Money, NewEvent, NewOrder, Order, OrderId,
    OrderStatus, ParseStatusError, SortOrder, StatusChange, UserId,
};
pub use workflow::{OrderPolicy, OrderWorkflow};
