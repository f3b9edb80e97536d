//! Order workflow behavior against the in-memory stores.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use boxoffice_core::{
    Actor, Money, OrderError, OrderPolicy, OrderStatus, UserId,
};
use boxoffice_testing::properties::{
    capacity, non_positive_quantity, order_status, ticket_price, valid_quantity,
};
use boxoffice_testing::{TestHarness, init_test_tracing};
use proptest::prelude::*;

// ============================================================================
// Purchase
// ============================================================================

#[tokio::test]
async fn test_purchase_computes_total_and_decrements() {
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(50_000), 100, 100);
    let buyer = UserId::new();

    let order = harness
        .workflow
        .create_order(&Actor::user(buyer), event.id, 3)
        .await
        .unwrap();

    assert_eq!(order.total_price, Money::new(150_000));
    assert_eq!(order.quantity, 3);
    assert_eq!(order.user_id, buyer);
    assert_eq!(order.event_id, event.id);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(harness.available(event.id), Some(97));
    assert_eq!(harness.ledger.orders(), vec![order]);
}

#[tokio::test]
async fn test_policy_can_skip_pending_stage() {
    let harness =
        TestHarness::with_policy(OrderPolicy::default().with_initial_status(OrderStatus::Success));
    let event = harness.seed_event(Money::new(10), 5, 5);

    let order = harness
        .workflow
        .create_order(&Actor::user(UserId::new()), event.id, 1)
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Success);
}

#[tokio::test]
async fn test_last_tickets_then_sold_out() {
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(1_000), 10, 2);

    harness
        .workflow
        .create_order(&Actor::user(UserId::new()), event.id, 2)
        .await
        .unwrap();
    assert_eq!(harness.available(event.id), Some(0));

    let err = harness
        .workflow
        .create_order(&Actor::user(UserId::new()), event.id, 1)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        OrderError::InsufficientInventory {
            requested: 1,
            available: 0
        }
    );
    assert_eq!(harness.ledger.orders().len(), 1);
}

#[tokio::test]
async fn test_anonymous_purchase_touches_nothing() {
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(1_000), 10, 10);

    let err = harness
        .workflow
        .create_order(&Actor::Anonymous, event.id, 1)
        .await
        .unwrap_err();

    assert_eq!(err, OrderError::Unauthenticated);
    assert_eq!(err.to_string(), "Please login to continue");
    assert!(harness.ledger.orders().is_empty());
    assert_eq!(harness.available(event.id), Some(10));
}

#[tokio::test]
async fn test_checks_run_in_order() {
    let harness = TestHarness::new();
    let missing = boxoffice_core::EventId::new();
    let buyer = Actor::user(UserId::new());

    // Anonymous wins over a bad quantity.
    assert_eq!(
        harness.workflow.create_order(&Actor::Anonymous, missing, 0).await,
        Err(OrderError::Unauthenticated)
    );
    // Quantity is checked before the event is looked up.
    assert_eq!(
        harness.workflow.create_order(&buyer, missing, 0).await,
        Err(OrderError::InvalidQuantity { quantity: 0 })
    );
    assert_eq!(
        harness.workflow.create_order(&buyer, missing, 11).await,
        Err(OrderError::QuantityExceedsLimit {
            requested: 11,
            limit: 10
        })
    );
    assert_eq!(
        harness.workflow.create_order(&buyer, missing, 1).await,
        Err(OrderError::EventNotFound(missing))
    );
}

#[tokio::test]
async fn test_unpublished_event_is_hidden_from_buyers() {
    let harness = TestHarness::new();
    let mut event = harness.seed_event(Money::new(1_000), 10, 10);
    event.published = false;
    harness.inventory.put(event.clone()).unwrap();

    assert_eq!(
        harness
            .workflow
            .create_order(&Actor::user(UserId::new()), event.id, 1)
            .await,
        Err(OrderError::EventNotFound(event.id))
    );
    assert!(
        harness
            .workflow
            .create_order(&Actor::admin(UserId::new()), event.id, 1)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_unlimited_policy_accepts_large_orders() {
    let harness = TestHarness::with_policy(OrderPolicy::default().with_max_tickets(None));
    let event = harness.seed_event(Money::new(5), 1_000, 1_000);

    let order = harness
        .workflow
        .create_order(&Actor::user(UserId::new()), event.id, 250)
        .await
        .unwrap();
    assert_eq!(order.total_price, Money::new(1_250));
}

#[tokio::test]
async fn test_price_overflow_is_invalid_quantity() {
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(u64::MAX), 10, 10);

    let err = harness
        .workflow
        .create_order(&Actor::user(UserId::new()), event.id, 2)
        .await
        .unwrap_err();

    assert_eq!(err, OrderError::InvalidQuantity { quantity: 2 });
    assert!(harness.ledger.orders().is_empty());
}

// ============================================================================
// Compensation
// ============================================================================

#[tokio::test]
async fn test_failed_decrement_discards_order() {
    init_test_tracing();
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(1_000), 10, 10);
    harness
        .inventory
        .fail_next_decrement(OrderError::StoreFailure("connection reset".to_string()))
        .unwrap();

    let err = harness
        .workflow
        .create_order(&Actor::user(UserId::new()), event.id, 2)
        .await
        .unwrap_err();

    assert_eq!(err, OrderError::StoreFailure("connection reset".to_string()));
    assert!(harness.ledger.orders().is_empty());
    assert_eq!(harness.available(event.id), Some(10));
}

#[tokio::test]
async fn test_lost_race_surfaces_insufficient_inventory() {
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(1_000), 10, 3);
    harness
        .inventory
        .fail_next_decrement(OrderError::InsufficientInventory {
            requested: 3,
            available: 1,
        })
        .unwrap();

    let err = harness
        .workflow
        .create_order(&Actor::user(UserId::new()), event.id, 3)
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::InsufficientInventory { .. }));
    assert!(harness.ledger.orders().is_empty());
}

#[tokio::test]
async fn test_failed_rollback_is_single_store_failure() {
    init_test_tracing();
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(1_000), 10, 10);
    harness
        .inventory
        .fail_next_decrement(OrderError::StoreFailure("timeout".to_string()))
        .unwrap();
    harness
        .ledger
        .fail_next_discard(OrderError::StoreFailure("timeout".to_string()))
        .unwrap();

    let err = harness
        .workflow
        .create_order(&Actor::user(UserId::new()), event.id, 2)
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::StoreFailure(_)));
    // The orphan stays behind; inventory is untouched.
    assert_eq!(harness.ledger.orders().len(), 1);
    assert_eq!(harness.available(event.id), Some(10));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_buyers_never_oversell() {
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(1_000), 50, 5);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let workflow = harness.workflow.clone();
        let event_id = event.id;
        handles.push(tokio::spawn(async move {
            let buyer = Actor::user(UserId::new());
            workflow.create_order(&buyer, event_id, 1).await
        }));
    }

    let mut sold = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => sold += 1,
            Err(err) => assert!(
                matches!(err, OrderError::InsufficientInventory { .. }),
                "unexpected error: {err}"
            ),
        }
    }

    assert_eq!(sold, 5);
    assert_eq!(harness.available(event.id), Some(0));
    assert_eq!(harness.ledger.orders().len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cancels_restore_once() {
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(1_000), 10, 10);
    let owner = UserId::new();
    let order = harness
        .workflow
        .create_order(&Actor::user(owner), event.id, 4)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let workflow = harness.workflow.clone();
        let order_id = order.id;
        handles.push(tokio::spawn(async move {
            workflow.cancel_order(&Actor::user(owner), order_id).await
        }));
    }

    let mut cancelled = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            cancelled += 1;
        }
    }

    assert_eq!(cancelled, 1);
    assert_eq!(harness.available(event.id), Some(10));
}

// ============================================================================
// Status transitions
// ============================================================================

#[tokio::test]
async fn test_cancel_restores_and_is_terminal() {
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(1_000), 10, 10);
    let owner = Actor::user(UserId::new());
    let admin = Actor::admin(UserId::new());

    let order = harness.workflow.create_order(&owner, event.id, 4).await.unwrap();
    assert_eq!(harness.available(event.id), Some(6));

    let cancelled = harness.workflow.cancel_order(&owner, order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.total_price, order.total_price);
    assert_eq!(harness.available(event.id), Some(10));

    let err = harness
        .workflow
        .update_order_status(&admin, order.id, OrderStatus::Success)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Cancelled,
            to: OrderStatus::Success
        }
    );
    assert_eq!(harness.available(event.id), Some(10));
}

#[tokio::test]
async fn test_admin_transitions() {
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(1_000), 10, 10);
    let owner = Actor::user(UserId::new());
    let admin = Actor::admin(UserId::new());

    let order = harness.workflow.create_order(&owner, event.id, 2).await.unwrap();

    let paid = harness
        .workflow
        .update_order_status(&admin, order.id, OrderStatus::Success)
        .await
        .unwrap();
    assert_eq!(paid.status, OrderStatus::Success);
    assert_eq!(harness.available(event.id), Some(8));

    assert_eq!(
        harness
            .workflow
            .update_order_status(&admin, order.id, OrderStatus::Pending)
            .await,
        Err(OrderError::InvalidTransition {
            from: OrderStatus::Success,
            to: OrderStatus::Pending
        })
    );

    harness
        .workflow
        .update_order_status(&admin, order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(harness.available(event.id), Some(10));
}

#[tokio::test]
async fn test_status_updates_are_admin_only() {
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(1_000), 10, 10);
    let owner = Actor::user(UserId::new());
    let order = harness.workflow.create_order(&owner, event.id, 2).await.unwrap();

    assert!(matches!(
        harness
            .workflow
            .update_order_status(&owner, order.id, OrderStatus::Success)
            .await,
        Err(OrderError::Unauthorized(_))
    ));
    assert_eq!(
        harness
            .workflow
            .update_order_status(&Actor::Anonymous, order.id, OrderStatus::Success)
            .await,
        Err(OrderError::Unauthenticated)
    );
}

#[tokio::test]
async fn test_restore_failure_keeps_cancellation() {
    init_test_tracing();
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(1_000), 10, 10);
    let owner = Actor::user(UserId::new());
    let order = harness.workflow.create_order(&owner, event.id, 3).await.unwrap();

    harness
        .inventory
        .fail_next_restore(OrderError::StoreFailure("timeout".to_string()))
        .unwrap();
    let err = harness.workflow.cancel_order(&owner, order.id).await.unwrap_err();

    assert!(matches!(err, OrderError::StoreFailure(_)));
    let stored = harness.ledger.orders();
    assert_eq!(stored[0].status, OrderStatus::Cancelled);
    assert_eq!(harness.available(event.id), Some(7));
}

// ============================================================================
// Reads and ownership
// ============================================================================

#[tokio::test]
async fn test_other_users_order_is_unauthorized() {
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(1_000), 10, 10);
    let owner = Actor::user(UserId::new());
    let stranger = Actor::user(UserId::new());
    let admin = Actor::admin(UserId::new());

    let order = harness.workflow.create_order(&owner, event.id, 1).await.unwrap();

    assert_eq!(harness.workflow.get_order(&owner, order.id).await.unwrap(), order);
    assert_eq!(harness.workflow.get_order(&admin, order.id).await.unwrap(), order);
    assert!(matches!(
        harness.workflow.get_order(&stranger, order.id).await,
        Err(OrderError::Unauthorized(_))
    ));
    assert!(matches!(
        harness.workflow.cancel_order(&stranger, order.id).await,
        Err(OrderError::Unauthorized(_))
    ));
    assert_eq!(harness.available(event.id), Some(9));
}

#[tokio::test]
async fn test_order_lists() {
    let harness = TestHarness::new();
    let event = harness.seed_event(Money::new(1_000), 10, 10);
    let alice = Actor::user(UserId::new());
    let bob = Actor::user(UserId::new());
    let admin = Actor::admin(UserId::new());

    let first = harness.workflow.create_order(&alice, event.id, 1).await.unwrap();
    harness.workflow.create_order(&bob, event.id, 1).await.unwrap();
    let second = harness.workflow.create_order(&alice, event.id, 1).await.unwrap();

    let mine = harness.workflow.list_my_orders(&alice).await.unwrap();
    assert_eq!(mine, vec![second, first]);

    assert_eq!(harness.workflow.list_all_orders(&admin).await.unwrap().len(), 3);
    assert!(matches!(
        harness.workflow.list_all_orders(&alice).await,
        Err(OrderError::Unauthorized(_))
    ));
    assert_eq!(
        harness.workflow.list_my_orders(&Actor::Anonymous).await,
        Err(OrderError::Unauthenticated)
    );
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_successful_purchase_decrements_exactly(
        (total, available) in capacity(),
        price in ticket_price(),
        quantity in valid_quantity(),
    ) {
        let harness = TestHarness::new();
        let event = harness.seed_event(price, total, available);
        let result = tokio_test::block_on(
            harness.workflow.create_order(&Actor::user(UserId::new()), event.id, quantity),
        );

        let requested = u32::try_from(quantity).unwrap();
        if requested <= available {
            let order = result.unwrap();
            prop_assert_eq!(harness.available(event.id), Some(available - requested));
            prop_assert_eq!(order.total_price.amount(), price.amount() * u64::from(requested));
        } else {
            prop_assert_eq!(
                result,
                Err(OrderError::InsufficientInventory { requested, available })
            );
            prop_assert_eq!(harness.available(event.id), Some(available));
        }
    }

    #[test]
    fn prop_non_positive_quantity_rejected(quantity in non_positive_quantity()) {
        let harness = TestHarness::new();
        let event = harness.seed_event(Money::new(100), 10, 10);
        let result = tokio_test::block_on(
            harness.workflow.create_order(&Actor::user(UserId::new()), event.id, quantity),
        );
        prop_assert_eq!(result, Err(OrderError::InvalidQuantity { quantity }));
        prop_assert_eq!(harness.available(event.id), Some(10));
    }

    #[test]
    fn prop_admin_transitions_follow_state_machine(
        reached in order_status(),
        target in order_status(),
    ) {
        let harness = TestHarness::new();
        let event = harness.seed_event(Money::new(100), 10, 10);
        let buyer = Actor::user(UserId::new());
        let admin = Actor::admin(UserId::new());

        let result = tokio_test::block_on(async {
            let order = harness.workflow.create_order(&buyer, event.id, 2).await.unwrap();
            if reached != OrderStatus::Pending {
                harness
                    .workflow
                    .update_order_status(&admin, order.id, reached)
                    .await
                    .unwrap();
            }
            harness.workflow.update_order_status(&admin, order.id, target).await
        });

        if reached.can_transition_to(target) {
            prop_assert_eq!(result.unwrap().status, target);
        } else {
            prop_assert_eq!(
                result,
                Err(OrderError::InvalidTransition { from: reached, to: target })
            );
        }
        let cancelled = reached == OrderStatus::Cancelled || target == OrderStatus::Cancelled;
        let expected = if cancelled { 10 } else { 8 };
        prop_assert_eq!(harness.available(event.id), Some(expected));
    }
}
