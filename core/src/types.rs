//! Domain types for the boxoffice ticketing backend.
//!
//! Contains the identifiers, value objects and records shared by every store
//! implementation: events (which double as inventory records), orders and the
//! order status state machine.

use crate::error::{OrderError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event (and its inventory record)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random `OrderId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OrderId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user (the actor owning orders)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Value Objects
// ============================================================================

/// Monetary amount in the smallest unit of the configured currency.
///
/// Prices are never negative, so the amount is unsigned. Arithmetic is
/// checked; callers decide how to report overflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from minor units
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Returns the amount in minor units
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.0
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Events (inventory records)
// ============================================================================

/// An event on sale: catalog data plus its ticket inventory.
///
/// `available_tickets` never exceeds `total_tickets`. It only goes down when an
/// order is created and only goes back up when an order is cancelled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier
    pub id: EventId,
    /// Event title (e.g., "Jazz Night")
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Venue or location
    pub location: String,
    /// When the event starts
    pub starts_at: DateTime<Utc>,
    /// When the event ends
    pub ends_at: DateTime<Utc>,
    /// Unit ticket price
    pub price: Money,
    /// Total capacity
    pub total_tickets: u32,
    /// Tickets still available for purchase
    pub available_tickets: u32,
    /// Reference to the event image, if any
    pub image_url: Option<String>,
    /// Shown on the landing page
    pub featured: bool,
    /// Visible to the public
    pub published: bool,
    /// When the event was created
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Builds an event record from admin input. All tickets start available.
    #[must_use]
    pub fn from_new(id: EventId, new: NewEvent, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            location: new.location,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            price: new.price,
            total_tickets: new.total_tickets,
            available_tickets: new.total_tickets,
            image_url: new.image_url,
            featured: new.featured,
            published: new.published,
            created_at,
        }
    }

    /// Checks whether `quantity` tickets can still be sold
    #[must_use]
    pub const fn has_availability(&self, quantity: u32) -> bool {
        quantity <= self.available_tickets
    }

    /// Number of tickets held by non-cancelled orders
    #[must_use]
    pub const fn sold(&self) -> u32 {
        self.total_tickets.saturating_sub(self.available_tickets)
    }

    /// Checks whether every ticket has been sold
    #[must_use]
    pub const fn is_sold_out(&self) -> bool {
        self.available_tickets == 0
    }
}

/// Admin input for creating an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Event title
    pub title: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Venue or location
    pub location: String,
    /// Start time
    pub starts_at: DateTime<Utc>,
    /// End time
    pub ends_at: DateTime<Utc>,
    /// Unit ticket price
    pub price: Money,
    /// Total capacity
    pub total_tickets: u32,
    /// Image reference
    #[serde(default)]
    pub image_url: Option<String>,
    /// Featured flag
    #[serde(default)]
    pub featured: bool,
    /// Published flag
    #[serde(default)]
    pub published: bool,
}

impl NewEvent {
    /// Validates admin input.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidEvent`] if the title is blank, the event
    /// ends before it starts, or it has no capacity.
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_schedule(self.starts_at, self.ends_at)?;
        if self.total_tickets == 0 {
            return Err(OrderError::InvalidEvent(
                "total_tickets must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial admin update of an event. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventUpdate {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New location
    pub location: Option<String>,
    /// New start time
    pub starts_at: Option<DateTime<Utc>>,
    /// New end time
    pub ends_at: Option<DateTime<Utc>>,
    /// New unit price (existing orders keep their total)
    pub price: Option<Money>,
    /// New capacity; availability shifts by the same delta
    pub total_tickets: Option<u32>,
    /// New image reference (`Some(None)` clears it)
    #[serde(with = "double_option")]
    pub image_url: Option<Option<String>>,
    /// New featured flag
    pub featured: Option<bool>,
    /// New published flag
    pub published: Option<bool>,
}

impl EventUpdate {
    /// Applies the update to `event` in place.
    ///
    /// Capacity changes keep the number of sold tickets constant.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidEvent`] if the result would be invalid,
    /// including shrinking capacity below the tickets already sold. `event` is
    /// left untouched on error.
    pub fn apply_to(&self, event: &mut Event) -> Result<()> {
        let mut updated = event.clone();

        if let Some(title) = &self.title {
            validate_title(title)?;
            updated.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            updated.description.clone_from(description);
        }
        if let Some(location) = &self.location {
            updated.location.clone_from(location);
        }
        if let Some(starts_at) = self.starts_at {
            updated.starts_at = starts_at;
        }
        if let Some(ends_at) = self.ends_at {
            updated.ends_at = ends_at;
        }
        validate_schedule(updated.starts_at, updated.ends_at)?;

        if let Some(price) = self.price {
            updated.price = price;
        }
        if let Some(total) = self.total_tickets {
            let sold = event.sold();
            if total < sold {
                return Err(OrderError::InvalidEvent(format!(
                    "total_tickets ({total}) cannot be lower than tickets already sold ({sold})"
                )));
            }
            if total == 0 {
                return Err(OrderError::InvalidEvent(
                    "total_tickets must be greater than 0".to_string(),
                ));
            }
            updated.total_tickets = total;
            updated.available_tickets = total - sold;
        }
        if let Some(image_url) = &self.image_url {
            updated.image_url.clone_from(image_url);
        }
        if let Some(featured) = self.featured {
            updated.featured = featured;
        }
        if let Some(published) = self.published {
            updated.published = published;
        }

        *event = updated;
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(OrderError::InvalidEvent("title must not be empty".to_string()));
    }
    Ok(())
}

fn validate_schedule(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<()> {
    if ends_at < starts_at {
        return Err(OrderError::InvalidEvent(
            "ends_at must not be before starts_at".to_string(),
        ));
    }
    Ok(())
}

/// Distinguishes "field absent" from "field explicitly null" for nullable updates.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Field used to order event listings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSort {
    /// Order by start time
    #[default]
    StartsAt,
    /// Order by creation time
    CreatedAt,
}

/// Sort direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest / earliest first
    #[default]
    Asc,
    /// Newest / latest first
    Desc,
}

/// Filter and ordering for event listings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventQuery {
    /// Only published events
    pub published_only: bool,
    /// Only featured events
    pub featured_only: bool,
    /// Case-insensitive substring matched against title and location
    pub search: Option<String>,
    /// Sort field
    pub sort: EventSort,
    /// Sort direction
    pub order: SortOrder,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl EventQuery {
    /// Query over published events only
    #[must_use]
    pub fn published() -> Self {
        Self {
            published_only: true,
            ..Self::default()
        }
    }

    /// Restricts to featured events
    #[must_use]
    pub const fn featured(mut self) -> Self {
        self.featured_only = true;
        self
    }

    /// Adds a text search
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search = if text.trim().is_empty() {
            None
        } else {
            Some(text.trim().to_string())
        };
        self
    }

    /// Sets sort field and direction
    #[must_use]
    pub const fn sorted_by(mut self, sort: EventSort, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    /// Caps the number of results
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Checks whether an event passes the filters (ignores sort and limit)
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if self.published_only && !event.published {
            return false;
        }
        if self.featured_only && !event.featured {
            return false;
        }
        match &self.search {
            Some(text) => {
                let needle = text.to_lowercase();
                event.title.to_lowercase().contains(&needle)
                    || event.location.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }

    /// Filters, sorts and truncates a set of events in memory
    #[must_use]
    pub fn apply(&self, events: impl IntoIterator<Item = Event>) -> Vec<Event> {
        let mut selected: Vec<Event> = events.into_iter().filter(|e| self.matches(e)).collect();
        selected.sort_by(|a, b| {
            let ordering = match self.sort {
                EventSort::StartsAt => a
                    .starts_at
                    .cmp(&b.starts_at)
                    .then_with(|| a.created_at.cmp(&b.created_at)),
                EventSort::CreatedAt => a.created_at.cmp(&b.created_at),
            }
            .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()));
            match self.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

// ============================================================================
// Orders
// ============================================================================

/// Order status state machine.
///
/// ```text
/// Pending ──► Success ──► Cancelled
///    │                        ▲
///    └────────────────────────┘
/// ```
///
/// `Cancelled` is terminal. `Success` can only move to `Cancelled`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created, awaiting settlement
    Pending,
    /// Paid / completed
    #[serde(alias = "completed", alias = "paid")]
    Success,
    /// Cancelled; tickets returned to inventory
    Cancelled,
}

impl OrderStatus {
    /// Checks whether moving from `self` to `next` is allowed
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Success | Self::Cancelled) | (Self::Success, Self::Cancelled)
        )
    }

    /// Validates a transition.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidTransition`] if the move is not allowed.
    pub fn transition_to(self, next: Self) -> Result<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(OrderError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Checks whether the order still holds inventory
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Canonical lowercase name, as stored and serialized
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string that names no order status.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status '{0}'")]
pub struct ParseStatusError(String);

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "success" | "completed" | "paid" => Ok(Self::Success),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A purchase record.
///
/// `quantity` and `total_price` are fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier
    pub id: OrderId,
    /// Owning user
    pub user_id: UserId,
    /// Purchased event
    pub event_id: EventId,
    /// Number of tickets
    pub quantity: u32,
    /// Unit price × quantity at creation time
    pub total_price: Money,
    /// Current status
    pub status: OrderStatus,
    /// When the order was created
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds an order record from ledger input
    #[must_use]
    pub fn from_new(id: OrderId, new: NewOrder, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            event_id: new.event_id,
            quantity: new.quantity,
            total_price: new.total_price,
            status: new.status,
            created_at,
        }
    }

    /// Checks whether `user_id` owns this order
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// Ledger input for appending an order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrder {
    /// Owning user
    pub user_id: UserId,
    /// Purchased event
    pub event_id: EventId,
    /// Number of tickets
    pub quantity: u32,
    /// Total price
    pub total_price: Money,
    /// Initial status
    pub status: OrderStatus,
}

/// Result of a successful status transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusChange {
    /// The order after the transition
    pub order: Order,
    /// Status before the transition
    pub previous: OrderStatus,
}

impl StatusChange {
    /// Checks whether this transition cancelled the order
    #[must_use]
    pub fn cancelled(&self) -> bool {
        self.previous.is_active() && self.order.status == OrderStatus::Cancelled
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    fn sample_event(total: u32, available: u32) -> Event {
        Event {
            id: EventId::new(),
            title: "Jazz Night".to_string(),
            description: String::new(),
            location: "Blue Hall".to_string(),
            starts_at: at(19),
            ends_at: at(22),
            price: Money::new(50_000),
            total_tickets: total,
            available_tickets: available,
            image_url: None,
            featured: false,
            published: true,
            created_at: at(1),
        }
    }

    #[test]
    fn test_allowed_transitions() {
        use OrderStatus::{Cancelled, Pending, Success};

        assert!(Pending.can_transition_to(Success));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Success.can_transition_to(Cancelled));

        assert!(!Success.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Success));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_transition_error_carries_states() {
        let err = OrderStatus::Success
            .transition_to(OrderStatus::Pending)
            .unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Success,
                to: OrderStatus::Pending,
            }
        );
    }

    #[test]
    fn test_status_aliases() {
        assert_eq!("completed".parse::<OrderStatus>().unwrap(), OrderStatus::Success);
        assert_eq!("PAID".parse::<OrderStatus>().unwrap(), OrderStatus::Success);
        assert_eq!("canceled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        let err = "Refunded".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err, ParseStatusError("refunded".to_string()));
        assert_eq!(err.to_string(), "unknown order status 'refunded'");

        let status: OrderStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, OrderStatus::Success);
        assert_eq!(serde_json::to_string(&OrderStatus::Success).unwrap(), "\"success\"");
    }

    #[test]
    fn test_money_multiply() {
        assert_eq!(Money::new(50_000).checked_multiply(3), Some(Money::new(150_000)));
        assert_eq!(Money::new(u64::MAX).checked_multiply(2), None);
    }

    #[test]
    fn test_new_event_validation() {
        let mut new = NewEvent {
            title: "Jazz Night".to_string(),
            description: String::new(),
            location: "Blue Hall".to_string(),
            starts_at: at(19),
            ends_at: at(22),
            price: Money::new(10),
            total_tickets: 100,
            image_url: None,
            featured: false,
            published: false,
        };
        assert!(new.validate().is_ok());

        new.title = "   ".to_string();
        assert!(matches!(new.validate(), Err(OrderError::InvalidEvent(_))));

        new.title = "Jazz Night".to_string();
        new.ends_at = new.starts_at - Duration::hours(1);
        assert!(matches!(new.validate(), Err(OrderError::InvalidEvent(_))));

        new.ends_at = at(22);
        new.total_tickets = 0;
        assert!(matches!(new.validate(), Err(OrderError::InvalidEvent(_))));
    }

    #[test]
    fn test_capacity_update_preserves_sold() {
        let mut event = sample_event(100, 60);
        let update = EventUpdate {
            total_tickets: Some(150),
            ..EventUpdate::default()
        };
        update.apply_to(&mut event).unwrap();
        assert_eq!(event.total_tickets, 150);
        assert_eq!(event.available_tickets, 110);
        assert_eq!(event.sold(), 40);
    }

    #[test]
    fn test_capacity_update_below_sold_rejected() {
        let mut event = sample_event(100, 60);
        let before = event.clone();
        let update = EventUpdate {
            total_tickets: Some(30),
            title: Some("Renamed".to_string()),
            ..EventUpdate::default()
        };
        assert!(matches!(
            update.apply_to(&mut event),
            Err(OrderError::InvalidEvent(_))
        ));
        assert_eq!(event, before);
    }

    #[test]
    fn test_image_url_can_be_cleared() {
        let mut event = sample_event(10, 10);
        event.image_url = Some("poster.png".to_string());

        let update: EventUpdate = serde_json::from_str(r#"{"image_url": null}"#).unwrap();
        update.apply_to(&mut event).unwrap();
        assert_eq!(event.image_url, None);

        let mut event = sample_event(10, 10);
        event.image_url = Some("poster.png".to_string());
        let untouched: EventUpdate = serde_json::from_str(r#"{"featured": true}"#).unwrap();
        untouched.apply_to(&mut event).unwrap();
        assert_eq!(event.image_url.as_deref(), Some("poster.png"));
        assert!(event.featured);
    }

    #[test]
    fn test_query_filters_and_orders() {
        let mut early = sample_event(10, 10);
        early.title = "Early Show".to_string();
        early.starts_at = at(10);
        early.ends_at = at(11);

        let mut late = sample_event(10, 10);
        late.title = "Late Show".to_string();
        late.featured = true;

        let mut hidden = sample_event(10, 10);
        hidden.published = false;

        let all = vec![late.clone(), hidden.clone(), early.clone()];

        let published = EventQuery::published().apply(all.clone());
        assert_eq!(published, vec![early.clone(), late.clone()]);

        let desc = EventQuery::published()
            .sorted_by(EventSort::StartsAt, SortOrder::Desc)
            .apply(all.clone());
        assert_eq!(desc.first().map(|e| e.id), Some(late.id));

        let featured = EventQuery::published().featured().apply(all.clone());
        assert_eq!(featured, vec![late.clone()]);

        let search = EventQuery::published().search("early").apply(all.clone());
        assert_eq!(search, vec![early.clone()]);

        let by_location = EventQuery::default().search("blue hall").apply(all.clone());
        assert_eq!(by_location.len(), 3);

        let limited = EventQuery::default().limit(1).apply(all);
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_equal_start_times_order_by_id() {
        let events: Vec<Event> = (0..5).map(|_| sample_event(10, 10)).collect();
        let mut by_id: Vec<EventId> = events.iter().map(|e| e.id).collect();
        by_id.sort_by(|a, b| a.as_uuid().cmp(b.as_uuid()));

        let forward: Vec<EventId> = EventQuery::default()
            .apply(events.clone())
            .into_iter()
            .map(|e| e.id)
            .collect();
        let backward: Vec<EventId> = EventQuery::default()
            .apply(events.iter().rev().cloned())
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(forward, by_id);
        assert_eq!(backward, by_id);

        let desc: Vec<EventId> = EventQuery::default()
            .sorted_by(EventSort::CreatedAt, SortOrder::Desc)
            .apply(events)
            .into_iter()
            .map(|e| e.id)
            .collect();
        by_id.reverse();
        assert_eq!(desc, by_id);
    }

    proptest! {
        #[test]
        fn prop_nothing_leaves_cancelled(next in prop_oneof![
            Just(OrderStatus::Pending),
            Just(OrderStatus::Success),
            Just(OrderStatus::Cancelled),
        ]) {
            prop_assert!(!OrderStatus::Cancelled.can_transition_to(next));
            prop_assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
            prop_assert!(next == OrderStatus::Pending || !next.can_transition_to(OrderStatus::Pending));
        }

        #[test]
        fn prop_capacity_update_keeps_invariant(
            total in 1u32..10_000,
            sold_ratio in 0u32..=100,
            new_total in 0u32..20_000,
        ) {
            let sold = total * sold_ratio / 100;
            let mut event = sample_event(total, total - sold);
            let update = EventUpdate { total_tickets: Some(new_total), ..EventUpdate::default() };

            match update.apply_to(&mut event) {
                Ok(()) => {
                    prop_assert!(event.available_tickets <= event.total_tickets);
                    prop_assert_eq!(event.sold(), sold);
                }
                Err(_) => prop_assert!(new_total < sold || new_total == 0),
            }
        }
    }
}
