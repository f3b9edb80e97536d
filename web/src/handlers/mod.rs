//! HTTP handlers.
//!
//! - [`health`]: liveness probe
//! - [`events`]: public event listings
//! - [`orders`]: purchases and the caller's own orders
//! - [`admin`]: event CRUD and order administration

pub mod admin;
pub mod events;
pub mod health;
pub mod orders;

use boxoffice_core::{Event, EventQuery, EventSort, Order, SortOrder};
use serde::{Deserialize, Serialize};

/// Query string accepted by event listings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListEventsParams {
    /// Case-insensitive text matched against title and location
    pub search: Option<String>,
    /// Only featured events
    pub featured: bool,
    /// Sort field (`starts_at` or `created_at`)
    pub sort: Option<EventSort>,
    /// Sort direction (`asc` or `desc`)
    pub order: Option<SortOrder>,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl ListEventsParams {
    /// Narrow `base` with these parameters.
    #[must_use]
    pub fn apply_to(self, mut base: EventQuery) -> EventQuery {
        if let Some(text) = self.search {
            base = base.search(text);
        }
        if self.featured {
            base = base.featured();
        }
        base = base.sorted_by(
            self.sort.unwrap_or_default(),
            self.order.unwrap_or_default(),
        );
        if let Some(limit) = self.limit {
            base = base.limit(limit);
        }
        base
    }
}

/// Response for event listings.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventListResponse {
    /// Matching events
    pub events: Vec<Event>,
    /// Number of events returned
    pub total: usize,
}

impl From<Vec<Event>> for EventListResponse {
    fn from(events: Vec<Event>) -> Self {
        Self {
            total: events.len(),
            events,
        }
    }
}

/// Response for order listings.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListResponse {
    /// Orders, newest first
    pub orders: Vec<Order>,
    /// Number of orders returned
    pub total: usize,
}

impl From<Vec<Order>> for OrderListResponse {
    fn from(orders: Vec<Order>) -> Self {
        Self {
            total: orders.len(),
            orders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_narrow_the_base_query() {
        let params = ListEventsParams {
            search: Some("  jazz ".to_string()),
            featured: true,
            sort: Some(EventSort::CreatedAt),
            order: Some(SortOrder::Desc),
            limit: Some(3),
        };

        let query = params.apply_to(EventQuery::published());

        assert!(query.published_only);
        assert!(query.featured_only);
        assert_eq!(query.search.as_deref(), Some("jazz"));
        assert_eq!(query.sort, EventSort::CreatedAt);
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.limit, Some(3));
    }

    #[test]
    fn test_empty_params_keep_defaults() {
        let query = ListEventsParams::default().apply_to(EventQuery::default());
        assert_eq!(query, EventQuery::default());
    }
}
