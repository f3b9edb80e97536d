//! Order workflow: the purchase saga and the order status state machine.
//!
//! # Purchase
//!
//! ```text
//! actor ─► authenticated? ─► quantity valid? ─► event visible? ─► enough tickets?
//!                                                                      │
//!        ┌─────────────────────────────────────────────────────────────┘
//!        ▼
//!  price × quantity ─► ledger.create ─► inventory.decrement_availability
//!                                              │
//!                                   fails ─────┴─► ledger.discard (compensation)
//! ```
//!
//! The decrement is conditional on the store side, so two buyers racing for
//! the last tickets cannot both succeed even though the availability check
//! above ran against a snapshot.
//!
//! # Cancellation
//!
//! Status changes go through [`OrderLedger::update_status`], which validates
//! the transition atomically. Only the caller whose transition actually moved
//! the order into `cancelled` restores inventory, so tickets come back once.

use crate::error::{OrderError, Result};
use crate::identity::{Identity, require_admin, require_authenticated, require_owner_or_admin};
use crate::metrics;
use crate::providers::{InventoryStore, OrderLedger};
use crate::types::{EventId, NewOrder, Order, OrderId, OrderStatus, StatusChange};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Purchase rules applied by [`OrderWorkflow`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPolicy {
    /// Maximum tickets per order; `None` means unlimited.
    pub max_tickets_per_order: Option<u32>,
    /// Status new orders start in. `Success` skips the pending stage.
    pub initial_status: OrderStatus,
}

impl OrderPolicy {
    /// Default per-order ticket limit
    pub const DEFAULT_MAX_TICKETS_PER_ORDER: u32 = 10;

    /// Sets the per-order limit
    #[must_use]
    pub const fn with_max_tickets(mut self, max: Option<u32>) -> Self {
        self.max_tickets_per_order = max;
        self
    }

    /// Sets the initial status of new orders
    #[must_use]
    pub const fn with_initial_status(mut self, status: OrderStatus) -> Self {
        self.initial_status = status;
        self
    }

    /// Validates a requested quantity and narrows it to a ticket count.
    ///
    /// # Errors
    ///
    /// - [`OrderError::InvalidQuantity`] if `quantity` is not positive (or
    ///   does not fit a ticket count)
    /// - [`OrderError::QuantityExceedsLimit`] if it is above the limit
    pub fn validate_quantity(&self, quantity: i64) -> Result<u32> {
        if quantity <= 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }
        if let Some(limit) = self.max_tickets_per_order {
            if quantity > i64::from(limit) {
                return Err(OrderError::QuantityExceedsLimit {
                    requested: quantity,
                    limit,
                });
            }
        }
        u32::try_from(quantity).map_err(|_| OrderError::InvalidQuantity { quantity })
    }
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self {
            max_tickets_per_order: Some(Self::DEFAULT_MAX_TICKETS_PER_ORDER),
            initial_status: OrderStatus::Pending,
        }
    }
}

/// Orchestrates purchases and order status changes over an inventory store
/// and an order ledger.
pub struct OrderWorkflow<I, L> {
    inventory: Arc<I>,
    ledger: Arc<L>,
    policy: OrderPolicy,
}

impl<I, L> Clone for OrderWorkflow<I, L> {
    fn clone(&self) -> Self {
        Self {
            inventory: Arc::clone(&self.inventory),
            ledger: Arc::clone(&self.ledger),
            policy: self.policy,
        }
    }
}

impl<I: InventoryStore, L: OrderLedger> OrderWorkflow<I, L> {
    /// Creates a workflow over the given stores.
    #[must_use]
    pub const fn new(inventory: Arc<I>, ledger: Arc<L>, policy: OrderPolicy) -> Self {
        Self {
            inventory,
            ledger,
            policy,
        }
    }

    /// Purchase rules in effect
    #[must_use]
    pub const fn policy(&self) -> &OrderPolicy {
        &self.policy
    }

    /// Buys `quantity` tickets for `event_id` on behalf of `actor`.
    ///
    /// Checks run in order and stop at the first failure: authentication,
    /// quantity, event visibility, availability. Nothing is written unless
    /// every check passes.
    ///
    /// # Errors
    ///
    /// - [`OrderError::Unauthenticated`] for anonymous actors
    /// - [`OrderError::InvalidQuantity`] / [`OrderError::QuantityExceedsLimit`]
    /// - [`OrderError::EventNotFound`] if the event is missing, or unpublished
    ///   and the actor is not an admin
    /// - [`OrderError::InsufficientInventory`] if too few tickets remain,
    ///   including when another purchase wins the race for them
    /// - [`OrderError::StoreFailure`] if persistence fails
    #[tracing::instrument(skip_all, fields(event_id = %event_id, quantity = quantity))]
    pub async fn create_order(
        &self,
        actor: &impl Identity,
        event_id: EventId,
        quantity: i64,
    ) -> Result<Order> {
        let result = self.purchase(actor, event_id, quantity).await;
        if let Err(error) = &result {
            if error.is_user_error() {
                tracing::warn!(reason = error.kind(), %error, "Purchase rejected");
            } else {
                tracing::error!(%error, "Purchase failed");
            }
            metrics::record_order_rejected(error);
        }
        result
    }

    async fn purchase(
        &self,
        actor: &impl Identity,
        event_id: EventId,
        quantity: i64,
    ) -> Result<Order> {
        let user_id = require_authenticated(actor)?;
        let quantity = self.policy.validate_quantity(quantity)?;

        let event = self.inventory.get(event_id).await?;
        if !event.published && !actor.is_admin() {
            return Err(OrderError::EventNotFound(event_id));
        }
        if !event.has_availability(quantity) {
            return Err(OrderError::InsufficientInventory {
                requested: quantity,
                available: event.available_tickets,
            });
        }

        let total_price = event
            .price
            .checked_multiply(quantity)
            .ok_or(OrderError::InvalidQuantity {
                quantity: i64::from(quantity),
            })?;

        let order = self
            .ledger
            .create(NewOrder {
                user_id,
                event_id,
                quantity,
                total_price,
                status: self.policy.initial_status,
            })
            .await?;

        match self.inventory.decrement_availability(event_id, quantity).await {
            Ok(updated) => {
                tracing::info!(
                    order_id = %order.id,
                    user_id = %user_id,
                    total_price = %order.total_price,
                    available = updated.available_tickets,
                    "Order created"
                );
                if updated.is_sold_out() {
                    tracing::info!(event_id = %event_id, "Event sold out");
                }
                metrics::record_order_created(&order, &updated);
                Ok(order)
            }
            Err(error) => Err(self.roll_back(order.id, error).await),
        }
    }

    /// Discards an order whose inventory update failed. Returns the error to
    /// surface to the caller.
    async fn roll_back(&self, order_id: OrderId, cause: OrderError) -> OrderError {
        tracing::warn!(order_id = %order_id, %cause, "Inventory update failed, discarding order");
        match self.ledger.discard(order_id).await {
            Ok(()) => cause,
            Err(discard_error) => {
                tracing::error!(
                    order_id = %order_id,
                    %cause,
                    %discard_error,
                    "Orphaned order: inventory update and rollback both failed"
                );
                OrderError::StoreFailure(format!(
                    "order {order_id} could not be rolled back after inventory failure ({cause}): {discard_error}"
                ))
            }
        }
    }

    /// Fetches an order visible to `actor` (its owner, or an admin).
    ///
    /// # Errors
    ///
    /// - [`OrderError::Unauthenticated`] for anonymous actors
    /// - [`OrderError::OrderNotFound`] if the order does not exist
    /// - [`OrderError::Unauthorized`] if it belongs to someone else
    pub async fn get_order(&self, actor: &impl Identity, order_id: OrderId) -> Result<Order> {
        require_authenticated(actor)?;
        let order = self.ledger.get_by_id(order_id).await?;
        require_owner_or_admin(actor, order.user_id)?;
        Ok(order)
    }

    /// Orders of the calling actor, newest first.
    ///
    /// # Errors
    ///
    /// [`OrderError::Unauthenticated`] for anonymous actors, or a store failure.
    pub async fn list_my_orders(&self, actor: &impl Identity) -> Result<Vec<Order>> {
        let user_id = require_authenticated(actor)?;
        self.ledger.list_by_user(user_id).await
    }

    /// Every order, newest first. Admin only.
    ///
    /// # Errors
    ///
    /// Authorization errors from [`require_admin`], or a store failure.
    pub async fn list_all_orders(&self, actor: &impl Identity) -> Result<Vec<Order>> {
        require_admin(actor)?;
        self.ledger.list_all().await
    }

    /// Moves an order to `status`. Admin only.
    ///
    /// # Errors
    ///
    /// - Authorization errors from [`require_admin`]
    /// - [`OrderError::OrderNotFound`] / [`OrderError::InvalidTransition`]
    /// - [`OrderError::StoreFailure`] if inventory could not be restored
    #[tracing::instrument(skip_all, fields(order_id = %order_id, status = %status))]
    pub async fn update_order_status(
        &self,
        actor: &impl Identity,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order> {
        require_admin(actor)?;
        self.transition(order_id, status).await
    }

    /// Cancels an order on behalf of its owner or an admin.
    ///
    /// # Errors
    ///
    /// - [`OrderError::Unauthenticated`] / [`OrderError::Unauthorized`]
    /// - [`OrderError::OrderNotFound`]
    /// - [`OrderError::InvalidTransition`] if it is already cancelled
    /// - [`OrderError::StoreFailure`] if inventory could not be restored
    #[tracing::instrument(skip_all, fields(order_id = %order_id))]
    pub async fn cancel_order(&self, actor: &impl Identity, order_id: OrderId) -> Result<Order> {
        require_authenticated(actor)?;
        let order = self.ledger.get_by_id(order_id).await?;
        require_owner_or_admin(actor, order.user_id)?;
        self.transition(order_id, OrderStatus::Cancelled).await
    }

    async fn transition(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        let change = self.ledger.update_status(order_id, status).await?;
        tracing::info!(
            order_id = %order_id,
            from = %change.previous,
            to = %change.order.status,
            "Order status changed"
        );

        if change.cancelled() {
            self.restore_inventory(&change).await?;
        }
        Ok(change.order)
    }

    async fn restore_inventory(&self, change: &StatusChange) -> Result<()> {
        let order = &change.order;
        match self
            .inventory
            .restore_availability(order.event_id, order.quantity)
            .await
        {
            Ok(event) => {
                tracing::info!(
                    order_id = %order.id,
                    event_id = %order.event_id,
                    restored = order.quantity,
                    available = event.available_tickets,
                    "Tickets returned to inventory"
                );
                metrics::record_order_cancelled(order.quantity, &event);
                Ok(())
            }
            Err(error) => {
                // The order stays cancelled; leaving it would need an illegal transition.
                tracing::error!(
                    order_id = %order.id,
                    event_id = %order.event_id,
                    quantity = order.quantity,
                    %error,
                    "Order cancelled but tickets were not returned to inventory"
                );
                Err(OrderError::StoreFailure(format!(
                    "order {} cancelled but inventory was not restored: {error}",
                    order.id
                )))
            }
        }
    }
}
