//! Property-based testing strategies for boxoffice domain types.

use boxoffice_core::types::{Money, OrderStatus};
use proptest::prelude::*;

/// Any order status.
pub fn order_status() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::Pending),
        Just(OrderStatus::Success),
        Just(OrderStatus::Cancelled),
    ]
}

/// A realistic unit price (up to 10 000.00 in minor units).
pub fn ticket_price() -> impl Strategy<Value = Money> {
    (0u64..=1_000_000).prop_map(Money::new)
}

/// A quantity the default policy accepts.
pub fn valid_quantity() -> impl Strategy<Value = i64> {
    1i64..=10
}

/// A quantity that must be refused as invalid.
pub fn non_positive_quantity() -> impl Strategy<Value = i64> {
    prop_oneof![Just(0i64), Just(i64::MIN), i64::MIN..0]
}

/// `(total, available)` capacity pairs with `available <= total`.
pub fn capacity() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=500).prop_flat_map(|total| (Just(total), 0..=total))
}
