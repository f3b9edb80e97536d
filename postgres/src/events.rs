//! `PostgreSQL` event and inventory store.

use crate::{db_error, out_of_range};
use boxoffice_core::error::{OrderError, Result};
use boxoffice_core::providers::{EventRepository, InventoryStore};
use boxoffice_core::types::{
    Event, EventId, EventQuery, EventSort, EventUpdate, Money, NewEvent, SortOrder,
};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

macro_rules! event_columns {
    () => {
        "id, title, description, location, starts_at, ends_at, price, \
         total_tickets, available_tickets, image_url, featured, published, created_at"
    };
}

const SELECT_EVENT: &str = concat!("SELECT ", event_columns!(), " FROM events WHERE id = $1");

const SELECT_EVENT_FOR_UPDATE: &str = concat!(
    "SELECT ",
    event_columns!(),
    " FROM events WHERE id = $1 FOR UPDATE"
);

const INSERT_EVENT: &str = concat!(
    "INSERT INTO events (id, title, description, location, starts_at, ends_at, price, \
     total_tickets, available_tickets, image_url, featured, published) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9, $10, $11) RETURNING ",
    event_columns!()
);

const UPDATE_EVENT: &str = concat!(
    "UPDATE events SET title = $2, description = $3, location = $4, starts_at = $5, \
     ends_at = $6, price = $7, total_tickets = $8, available_tickets = $9, image_url = $10, \
     featured = $11, published = $12 WHERE id = $1 RETURNING ",
    event_columns!()
);

const DECREMENT_AVAILABILITY: &str = concat!(
    "UPDATE events SET available_tickets = available_tickets - $2 \
     WHERE id = $1 AND available_tickets >= $2 RETURNING ",
    event_columns!()
);

const RESTORE_AVAILABILITY: &str = concat!(
    "UPDATE events SET available_tickets = LEAST(total_tickets, available_tickets + $2) \
     WHERE id = $1 RETURNING ",
    event_columns!()
);

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    location: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    price: i64,
    total_tickets: i32,
    available_tickets: i32,
    image_url: Option<String>,
    featured: bool,
    published: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = OrderError;

    fn try_from(row: EventRow) -> Result<Self> {
        Ok(Self {
            id: EventId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            location: row.location,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            price: Money::new(u64::try_from(row.price).map_err(|_| out_of_range("price"))?),
            total_tickets: u32::try_from(row.total_tickets)
                .map_err(|_| out_of_range("total_tickets"))?,
            available_tickets: u32::try_from(row.available_tickets)
                .map_err(|_| out_of_range("available_tickets"))?,
            image_url: row.image_url,
            featured: row.featured,
            published: row.published,
            created_at: row.created_at,
        })
    }
}

fn price_param(price: Money) -> Result<i64> {
    i64::try_from(price.amount()).map_err(|_| out_of_range("price"))
}

fn tickets_param(tickets: u32, field: &str) -> Result<i32> {
    i32::try_from(tickets).map_err(|_| out_of_range(field))
}

/// Escapes `LIKE` wildcards so user text matches literally.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `PostgreSQL` event store.
///
/// Implements both the inventory operations used by the order workflow and
/// the event CRUD used by the catalog.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: EventId) -> Result<Option<Event>> {
        sqlx::query_as::<_, EventRow>(SELECT_EVENT)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to get event", &e))?
            .map(Event::try_from)
            .transpose()
    }

    async fn active_orders(&self, id: EventId) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM orders WHERE event_id = $1 AND status <> 'cancelled'",
        )
        .bind(*id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to count orders", &e))?;
        u64::try_from(count).map_err(|_| out_of_range("order count"))
    }
}

impl InventoryStore for PostgresEventStore {
    async fn get(&self, id: EventId) -> Result<Event> {
        self.fetch(id).await?.ok_or(OrderError::EventNotFound(id))
    }

    #[tracing::instrument(skip_all, fields(event_id = %id, amount = amount))]
    async fn decrement_availability(&self, id: EventId, amount: u32) -> Result<Event> {
        let requested = tickets_param(amount, "amount")?;

        let updated = sqlx::query_as::<_, EventRow>(DECREMENT_AVAILABILITY)
            .bind(*id.as_uuid())
            .bind(requested)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to decrement availability", &e))?;

        if let Some(row) = updated {
            return Event::try_from(row);
        }

        // Nothing matched: the event is gone or has too few tickets left.
        match self.fetch(id).await? {
            None => Err(OrderError::EventNotFound(id)),
            Some(event) => Err(OrderError::InsufficientInventory {
                requested: amount,
                available: event.available_tickets,
            }),
        }
    }

    #[tracing::instrument(skip_all, fields(event_id = %id, amount = amount))]
    async fn restore_availability(&self, id: EventId, amount: u32) -> Result<Event> {
        let amount = tickets_param(amount, "amount")?;

        sqlx::query_as::<_, EventRow>(RESTORE_AVAILABILITY)
            .bind(*id.as_uuid())
            .bind(amount)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to restore availability", &e))?
            .ok_or(OrderError::EventNotFound(id))
            .and_then(Event::try_from)
    }
}

impl EventRepository for PostgresEventStore {
    async fn insert(&self, new: NewEvent) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(INSERT_EVENT)
            .bind(Uuid::new_v4())
            .bind(&new.title)
            .bind(&new.description)
            .bind(&new.location)
            .bind(new.starts_at)
            .bind(new.ends_at)
            .bind(price_param(new.price)?)
            .bind(tickets_param(new.total_tickets, "total_tickets")?)
            .bind(&new.image_url)
            .bind(new.featured)
            .bind(new.published)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to insert event", &e))?;
        Event::try_from(row)
    }

    async fn update(&self, id: EventId, update: EventUpdate) -> Result<Event> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", &e))?;

        let row = sqlx::query_as::<_, EventRow>(SELECT_EVENT_FOR_UPDATE)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to lock event", &e))?
            .ok_or(OrderError::EventNotFound(id))?;

        let mut event = Event::try_from(row)?;
        update.apply_to(&mut event)?;

        let row = sqlx::query_as::<_, EventRow>(UPDATE_EVENT)
            .bind(*id.as_uuid())
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.location)
            .bind(event.starts_at)
            .bind(event.ends_at)
            .bind(price_param(event.price)?)
            .bind(tickets_param(event.total_tickets, "total_tickets")?)
            .bind(tickets_param(event.available_tickets, "available_tickets")?)
            .bind(&event.image_url)
            .bind(event.featured)
            .bind(event.published)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to update event", &e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit event update", &e))?;
        Event::try_from(row)
    }

    async fn delete(&self, id: EventId) -> Result<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(OrderError::EventNotFound(id)),
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                // An order slipped in after the active-order check.
                Err(OrderError::EventInUse {
                    event_id: id,
                    active_orders: self.active_orders(id).await?,
                })
            }
            Err(e) => Err(db_error("Failed to delete event", &e)),
        }
    }

    async fn list(&self, query: EventQuery) -> Result<Vec<Event>> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(concat!("SELECT ", event_columns!(), " FROM events WHERE TRUE"));

        if query.published_only {
            builder.push(" AND published");
        }
        if query.featured_only {
            builder.push(" AND featured");
        }
        if let Some(text) = &query.search {
            let pattern = like_pattern(text);
            builder
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR location ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        let direction = match query.order {
            SortOrder::Asc => " ASC",
            SortOrder::Desc => " DESC",
        };
        // Ties fall back to creation time, then id, in the same direction.
        builder.push(match query.sort {
            EventSort::StartsAt => " ORDER BY starts_at",
            EventSort::CreatedAt => " ORDER BY created_at",
        });
        builder.push(direction);
        if query.sort == EventSort::StartsAt {
            builder.push(", created_at").push(direction);
        }
        builder.push(", id").push(direction);

        if let Some(limit) = query.limit {
            builder
                .push(" LIMIT ")
                .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        builder
            .build_query_as::<EventRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list events", &e))?
            .into_iter()
            .map(Event::try_from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("jazz"), "%jazz%");
        assert_eq!(like_pattern("100%_off\\"), "%100\\%\\_off\\\\%");
    }
}
