//! In-memory order ledger.

use boxoffice_core::environment::{Clock, SystemClock};
use boxoffice_core::error::{OrderError, Result};
use boxoffice_core::providers::OrderLedger;
use boxoffice_core::types::{
    EventId, NewOrder, Order, OrderId, OrderStatus, StatusChange, UserId,
};
use std::future::Future;
use std::sync::{Arc, Mutex};

fn poisoned<T>(_: T) -> OrderError {
    OrderError::StoreFailure("order ledger lock poisoned".to_string())
}

/// In-memory order ledger.
///
/// Orders are kept in insertion order. Status transitions validate and write
/// under one lock, so a double cancel is rejected the second time.
#[derive(Clone)]
pub struct InMemoryOrderLedger {
    orders: Arc<Mutex<Vec<Order>>>,
    clock: Arc<dyn Clock>,
    next_discard_error: Arc<Mutex<Option<OrderError>>>,
}

impl InMemoryOrderLedger {
    /// Create an empty ledger using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Create an empty ledger stamping orders with `clock`.
    #[must_use]
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            orders: Arc::new(Mutex::new(Vec::new())),
            clock: Arc::new(clock),
            next_discard_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Snapshot of every order, in insertion order.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// Number of non-cancelled orders for an event, read synchronously.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn active_orders_for(&self, event_id: EventId) -> Result<u64> {
        count_active(&self.orders, event_id)
    }

    /// Make the next `discard` call fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn fail_next_discard(&self, error: OrderError) -> Result<()> {
        *self.next_discard_error.lock().map_err(poisoned)? = Some(error);
        Ok(())
    }
}

impl Default for InMemoryOrderLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn count_active(orders: &Mutex<Vec<Order>>, event_id: EventId) -> Result<u64> {
    let count = orders
        .lock()
        .map_err(poisoned)?
        .iter()
        .filter(|o| o.event_id == event_id && o.status.is_active())
        .count();
    Ok(count as u64)
}

fn newest_first(orders: impl DoubleEndedIterator<Item = Order>) -> Vec<Order> {
    let mut orders: Vec<Order> = orders.rev().collect();
    // Stable sort keeps later inserts first among equal timestamps.
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

impl OrderLedger for InMemoryOrderLedger {
    fn create(&self, new: NewOrder) -> impl Future<Output = Result<Order>> + Send {
        let orders = Arc::clone(&self.orders);
        let order = Order::from_new(OrderId::new(), new, self.clock.now());

        async move {
            orders.lock().map_err(poisoned)?.push(order.clone());
            Ok(order)
        }
    }

    fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<StatusChange>> + Send {
        let orders = Arc::clone(&self.orders);

        async move {
            let mut orders = orders.lock().map_err(poisoned)?;
            let order = orders
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or(OrderError::OrderNotFound(id))?;
            let previous = order.status;
            order.status = previous.transition_to(status)?;
            Ok(StatusChange {
                order: order.clone(),
                previous,
            })
        }
    }

    fn get_by_id(&self, id: OrderId) -> impl Future<Output = Result<Order>> + Send {
        let orders = Arc::clone(&self.orders);

        async move {
            orders
                .lock()
                .map_err(poisoned)?
                .iter()
                .find(|o| o.id == id)
                .cloned()
                .ok_or(OrderError::OrderNotFound(id))
        }
    }

    fn list_by_user(&self, user_id: UserId) -> impl Future<Output = Result<Vec<Order>>> + Send {
        let orders = Arc::clone(&self.orders);

        async move {
            let orders = orders.lock().map_err(poisoned)?;
            Ok(newest_first(
                orders.iter().filter(|o| o.is_owned_by(user_id)).cloned(),
            ))
        }
    }

    fn list_all(&self) -> impl Future<Output = Result<Vec<Order>>> + Send {
        let orders = Arc::clone(&self.orders);

        async move {
            let orders = orders.lock().map_err(poisoned)?;
            Ok(newest_first(orders.iter().cloned()))
        }
    }

    fn discard(&self, id: OrderId) -> impl Future<Output = Result<()>> + Send {
        let orders = Arc::clone(&self.orders);
        let injected = Arc::clone(&self.next_discard_error);

        async move {
            if let Some(error) = injected.lock().map_err(poisoned)?.take() {
                return Err(error);
            }

            let mut orders = orders.lock().map_err(poisoned)?;
            let index = orders
                .iter()
                .position(|o| o.id == id)
                .ok_or(OrderError::OrderNotFound(id))?;
            orders.remove(index);
            Ok(())
        }
    }

    fn count_active_for_event(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<u64>> + Send {
        let orders = Arc::clone(&self.orders);

        async move { count_active(&orders, event_id) }
    }

    fn purge_cancelled_for_event(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = Result<u64>> + Send {
        let orders = Arc::clone(&self.orders);

        async move {
            let mut orders = orders.lock().map_err(poisoned)?;
            let before = orders.len();
            orders.retain(|o| !(o.event_id == event_id && o.status == OrderStatus::Cancelled));
            Ok((before - orders.len()) as u64)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{SteppingClock, test_clock};
    use boxoffice_core::types::Money;
    use chrono::Duration;

    fn new_order(user_id: UserId, event_id: EventId) -> NewOrder {
        NewOrder {
            user_id,
            event_id,
            quantity: 2,
            total_price: Money::new(200),
            status: OrderStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_double_cancel_rejected() {
        let ledger = InMemoryOrderLedger::with_clock(test_clock());
        let order = ledger.create(new_order(UserId::new(), EventId::new())).await.unwrap();

        let change = ledger.update_status(order.id, OrderStatus::Cancelled).await.unwrap();
        assert!(change.cancelled());
        assert_eq!(change.previous, OrderStatus::Pending);

        let err = ledger.update_status(order.id, OrderStatus::Cancelled).await.unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Cancelled
            }
        );
    }

    #[tokio::test]
    async fn test_lists_newest_first() {
        let clock = SteppingClock::new(test_clock().now(), Duration::minutes(1));
        let ledger = InMemoryOrderLedger::with_clock(clock);
        let alice = UserId::new();
        let bob = UserId::new();
        let event = EventId::new();

        let first = ledger.create(new_order(alice, event)).await.unwrap();
        let other = ledger.create(new_order(bob, event)).await.unwrap();
        let second = ledger.create(new_order(alice, event)).await.unwrap();

        let mine: Vec<OrderId> = ledger
            .list_by_user(alice)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(mine, vec![second.id, first.id]);

        let all = ledger.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].id, other.id);
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_insertion_recency() {
        let ledger = InMemoryOrderLedger::with_clock(test_clock());
        let user = UserId::new();
        let first = ledger.create(new_order(user, EventId::new())).await.unwrap();
        let second = ledger.create(new_order(user, EventId::new())).await.unwrap();

        let ids: Vec<OrderId> = ledger.list_all().await.unwrap().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_purge_only_touches_cancelled_orders_of_event() {
        let ledger = InMemoryOrderLedger::new();
        let user = UserId::new();
        let event = EventId::new();
        let elsewhere = EventId::new();

        let cancelled = ledger.create(new_order(user, event)).await.unwrap();
        ledger.update_status(cancelled.id, OrderStatus::Cancelled).await.unwrap();
        let active = ledger.create(new_order(user, event)).await.unwrap();
        let other = ledger.create(new_order(user, elsewhere)).await.unwrap();
        ledger.update_status(other.id, OrderStatus::Cancelled).await.unwrap();

        assert_eq!(ledger.count_active_for_event(event).await.unwrap(), 1);
        assert_eq!(ledger.purge_cancelled_for_event(event).await.unwrap(), 1);

        let remaining: Vec<OrderId> = ledger.orders().into_iter().map(|o| o.id).collect();
        assert_eq!(remaining, vec![active.id, other.id]);
    }

    #[tokio::test]
    async fn test_discard_removes_order() {
        let ledger = InMemoryOrderLedger::new();
        let order = ledger.create(new_order(UserId::new(), EventId::new())).await.unwrap();
        ledger.discard(order.id).await.unwrap();
        assert_eq!(
            ledger.get_by_id(order.id).await,
            Err(OrderError::OrderNotFound(order.id))
        );
    }
}
