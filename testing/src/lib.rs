//! # Boxoffice Testing
//!
//! Testing utilities for the boxoffice ticketing backend.
//!
//! This crate provides:
//! - In-memory implementations of the store traits
//! - Deterministic clocks
//! - Fixtures and a wired-up [`TestHarness`]
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_core::{Actor, Money, UserId};
//! use boxoffice_testing::TestHarness;
//!
//! #[tokio::test]
//! async fn test_purchase() {
//!     let harness = TestHarness::new();
//!     let event = harness.seed_event(Money::new(50_000), 100, 100);
//!
//!     let order = harness
//!         .workflow
//!         .create_order(&Actor::user(UserId::new()), event.id, 3)
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(order.total_price, Money::new(150_000));
//!     assert_eq!(harness.available(event.id), Some(97));
//! }
//! ```

pub mod fixtures;
pub mod mocks;
pub mod properties;

// Re-export commonly used items
pub use fixtures::{TestHarness, init_test_tracing, new_event};
pub use mocks::{
    FixedClock, InMemoryInventoryStore, InMemoryOrderLedger, SteppingClock, test_clock,
};
