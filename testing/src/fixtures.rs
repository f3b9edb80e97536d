//! Test data builders and a wired-up harness.

use crate::mocks::{InMemoryInventoryStore, InMemoryOrderLedger, test_clock};
use boxoffice_core::environment::Clock;
use boxoffice_core::types::{Event, EventId, Money, NewEvent};
use boxoffice_core::{EventCatalog, OrderPolicy, OrderWorkflow};
use chrono::Duration;
use std::sync::Arc;

/// A published event starting a week after the test clock, lasting three hours.
#[must_use]
pub fn new_event(title: &str, price: Money, total_tickets: u32) -> NewEvent {
    let starts_at = test_clock().now() + Duration::days(7);
    NewEvent {
        title: title.to_string(),
        description: format!("{title} description"),
        location: "Main Hall".to_string(),
        starts_at,
        ends_at: starts_at + Duration::hours(3),
        price,
        total_tickets,
        image_url: None,
        featured: false,
        published: true,
    }
}

/// Workflow type wired to the in-memory stores.
pub type InMemoryWorkflow = OrderWorkflow<InMemoryInventoryStore, InMemoryOrderLedger>;

/// Catalog type wired to the in-memory stores.
pub type InMemoryCatalog = EventCatalog<InMemoryInventoryStore, InMemoryOrderLedger>;

/// In-memory stores plus the workflow and catalog built on them.
pub struct TestHarness {
    /// Event and inventory store
    pub inventory: InMemoryInventoryStore,
    /// Order ledger
    pub ledger: InMemoryOrderLedger,
    /// Order workflow over both stores
    pub workflow: InMemoryWorkflow,
    /// Event catalog over both stores
    pub catalog: InMemoryCatalog,
}

impl TestHarness {
    /// Harness with the default policy and the fixed test clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(OrderPolicy::default())
    }

    /// Harness with a custom purchase policy.
    #[must_use]
    pub fn with_policy(policy: OrderPolicy) -> Self {
        let ledger = InMemoryOrderLedger::with_clock(test_clock());
        let inventory = InMemoryInventoryStore::with_clock(test_clock()).with_ledger(ledger.clone());
        let shared_inventory = Arc::new(inventory.clone());
        let shared_ledger = Arc::new(ledger.clone());
        Self {
            workflow: OrderWorkflow::new(
                Arc::clone(&shared_inventory),
                Arc::clone(&shared_ledger),
                policy,
            ),
            catalog: EventCatalog::new(shared_inventory, shared_ledger),
            inventory,
            ledger,
        }
    }

    /// Seed a published event with `available` of `total` tickets left.
    ///
    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn seed_event(&self, price: Money, total: u32, available: u32) -> Event {
        let mut event = Event::from_new(
            EventId::new(),
            new_event("Jazz Night", price, total),
            test_clock().now(),
        );
        event.available_tickets = available;
        self.inventory.put(event.clone()).expect("seed event");
        event
    }

    /// Current availability of an event, or `None` if it is gone.
    #[must_use]
    pub fn available(&self, id: EventId) -> Option<u32> {
        self.inventory.snapshot(id).map(|e| e.available_tickets)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Install a tracing subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
