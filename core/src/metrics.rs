//! Business metrics for ticket ordering.
//!
//! Recorded through the `metrics` facade; the server binary installs the
//! Prometheus exporter. Without an installed recorder every call is a no-op,
//! which is what tests rely on.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `boxoffice_orders_created_total` - Orders created
//! - `boxoffice_orders_rejected_total{reason}` - Purchases refused, by error kind
//! - `boxoffice_tickets_sold_total` - Tickets taken out of inventory
//! - `boxoffice_orders_cancelled_total` - Orders moved to `cancelled`
//! - `boxoffice_tickets_restored_total` - Tickets returned to inventory
//! - `boxoffice_events_created_total` - Events created by admins
//! - `boxoffice_events_deleted_total` - Events deleted by admins
//! - `boxoffice_events_sold_out_total` - Purchases that took the last tickets
//!
//! ## Gauges
//! - `boxoffice_tickets_available{event_id}` - Availability after the last
//!   change; set to zero when the event is deleted
//!
//! ## Histograms
//! - `boxoffice_order_value` - Order totals in minor currency units

use crate::error::OrderError;
use crate::types::{Event, EventId, Order};
use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all metric descriptions.
///
/// Call once at startup, after installing a recorder.
pub fn register_metrics() {
    describe_counter!("boxoffice_orders_created_total", "Total number of orders created");
    describe_counter!(
        "boxoffice_orders_rejected_total",
        "Total number of purchase attempts refused, by reason"
    );
    describe_counter!(
        "boxoffice_tickets_sold_total",
        "Total number of tickets taken out of inventory"
    );
    describe_counter!(
        "boxoffice_orders_cancelled_total",
        "Total number of orders cancelled"
    );
    describe_counter!(
        "boxoffice_tickets_restored_total",
        "Total number of tickets returned to inventory by cancellations"
    );
    describe_counter!(
        "boxoffice_events_created_total",
        "Total number of events created"
    );
    describe_counter!(
        "boxoffice_events_deleted_total",
        "Total number of events deleted"
    );
    describe_counter!(
        "boxoffice_events_sold_out_total",
        "Total number of purchases that sold the last tickets of an event"
    );
    describe_gauge!(
        "boxoffice_tickets_available",
        "Tickets still available per event"
    );
    describe_histogram!("boxoffice_order_value", "Order totals in minor currency units");

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a completed purchase.
pub fn record_order_created(order: &Order, event: &Event) {
    metrics::counter!("boxoffice_orders_created_total").increment(1);
    metrics::counter!("boxoffice_tickets_sold_total").increment(u64::from(order.quantity));
    #[allow(clippy::cast_precision_loss)]
    let value = order.total_price.amount() as f64;
    metrics::histogram!("boxoffice_order_value").record(value);
    if event.is_sold_out() {
        metrics::counter!("boxoffice_events_sold_out_total").increment(1);
    }
    record_tickets_available(event);
}

/// Record a refused purchase.
pub fn record_order_rejected(error: &OrderError) {
    metrics::counter!("boxoffice_orders_rejected_total", "reason" => error.kind()).increment(1);
}

/// Record a cancellation and the tickets it returned.
pub fn record_order_cancelled(quantity: u32, event: &Event) {
    metrics::counter!("boxoffice_orders_cancelled_total").increment(1);
    metrics::counter!("boxoffice_tickets_restored_total").increment(u64::from(quantity));
    record_tickets_available(event);
}

/// Record an event created by an admin.
pub fn record_event_created(event: &Event) {
    metrics::counter!("boxoffice_events_created_total").increment(1);
    record_tickets_available(event);
}

/// Record an admin update, which may have changed capacity.
pub fn record_event_updated(event: &Event) {
    record_tickets_available(event);
}

/// Record a deleted event and zero its availability series.
pub fn record_event_deleted(id: EventId) {
    metrics::counter!("boxoffice_events_deleted_total").increment(1);
    metrics::gauge!("boxoffice_tickets_available", "event_id" => id.to_string()).set(0.0);
}

fn record_tickets_available(event: &Event) {
    metrics::gauge!("boxoffice_tickets_available", "event_id" => event.id.to_string())
        .set(f64::from(event.available_tickets));
}
