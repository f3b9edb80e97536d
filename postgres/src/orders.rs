//! `PostgreSQL` order ledger.

use crate::{db_error, out_of_range};
use boxoffice_core::error::{OrderError, Result};
use boxoffice_core::providers::OrderLedger;
use boxoffice_core::types::{
    EventId, Money, NewOrder, Order, OrderId, OrderStatus, ParseStatusError, StatusChange, UserId,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

macro_rules! order_columns {
    () => {
        "id, user_id, event_id, quantity, total_price, status, created_at"
    };
}

const INSERT_ORDER: &str = concat!(
    "INSERT INTO orders (id, user_id, event_id, quantity, total_price, status) \
     VALUES ($1, $2, $3, $4, $5, $6) RETURNING ",
    order_columns!()
);

const SELECT_ORDER: &str = concat!("SELECT ", order_columns!(), " FROM orders WHERE id = $1");

const SELECT_ORDER_FOR_UPDATE: &str = concat!(
    "SELECT ",
    order_columns!(),
    " FROM orders WHERE id = $1 FOR UPDATE"
);

const UPDATE_STATUS: &str = concat!(
    "UPDATE orders SET status = $2 WHERE id = $1 RETURNING ",
    order_columns!()
);

const SELECT_BY_USER: &str = concat!(
    "SELECT ",
    order_columns!(),
    " FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
);

const SELECT_ALL: &str = concat!(
    "SELECT ",
    order_columns!(),
    " FROM orders ORDER BY created_at DESC, id DESC"
);

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    event_id: Uuid,
    quantity: i32,
    total_price: i64,
    status: String,
    created_at: DateTime<Utc>,
}

/// A status column value the domain does not know is corrupt data.
fn decode_status(raw: &str) -> Result<OrderStatus> {
    raw.parse()
        .map_err(|e: ParseStatusError| OrderError::StoreFailure(e.to_string()))
}

impl TryFrom<OrderRow> for Order {
    type Error = OrderError;

    fn try_from(row: OrderRow) -> Result<Self> {
        Ok(Self {
            id: OrderId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            event_id: EventId::from_uuid(row.event_id),
            quantity: u32::try_from(row.quantity).map_err(|_| out_of_range("quantity"))?,
            total_price: Money::new(
                u64::try_from(row.total_price).map_err(|_| out_of_range("total_price"))?,
            ),
            status: decode_status(&row.status)?,
            created_at: row.created_at,
        })
    }
}

/// `PostgreSQL` order ledger.
#[derive(Clone)]
pub struct PostgresOrderLedger {
    pool: PgPool,
}

impl PostgresOrderLedger {
    /// Create a ledger over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_many(&self, sql: &'static str, user_id: Option<UserId>) -> Result<Vec<Order>> {
        let mut query = sqlx::query_as::<_, OrderRow>(sql);
        if let Some(user_id) = user_id {
            query = query.bind(*user_id.as_uuid());
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list orders", &e))?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }
}

impl OrderLedger for PostgresOrderLedger {
    async fn create(&self, new: NewOrder) -> Result<Order> {
        let quantity = i32::try_from(new.quantity).map_err(|_| out_of_range("quantity"))?;
        let total_price =
            i64::try_from(new.total_price.amount()).map_err(|_| out_of_range("total_price"))?;

        let row = sqlx::query_as::<_, OrderRow>(INSERT_ORDER)
            .bind(Uuid::new_v4())
            .bind(*new.user_id.as_uuid())
            .bind(*new.event_id.as_uuid())
            .bind(quantity)
            .bind(total_price)
            .bind(new.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    OrderError::EventNotFound(new.event_id)
                }
                _ => db_error("Failed to create order", &e),
            })?;
        Order::try_from(row)
    }

    #[tracing::instrument(skip_all, fields(order_id = %id, status = %status))]
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<StatusChange> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", &e))?;

        // The row lock serializes concurrent transitions of the same order.
        let current = sqlx::query_as::<_, OrderRow>(SELECT_ORDER_FOR_UPDATE)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to lock order", &e))?
            .ok_or(OrderError::OrderNotFound(id))?;

        let previous = decode_status(&current.status)?;
        let next = previous.transition_to(status)?;

        let row = sqlx::query_as::<_, OrderRow>(UPDATE_STATUS)
            .bind(*id.as_uuid())
            .bind(next.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to update order status", &e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit status change", &e))?;

        Ok(StatusChange {
            order: Order::try_from(row)?,
            previous,
        })
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Order> {
        sqlx::query_as::<_, OrderRow>(SELECT_ORDER)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to get order", &e))?
            .ok_or(OrderError::OrderNotFound(id))
            .and_then(Order::try_from)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        self.fetch_many(SELECT_BY_USER, Some(user_id)).await
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        self.fetch_many(SELECT_ALL, None).await
    }

    async fn discard(&self, id: OrderId) -> Result<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to discard order", &e))?;

        if result.rows_affected() == 0 {
            return Err(OrderError::OrderNotFound(id));
        }
        Ok(())
    }

    async fn count_active_for_event(&self, event_id: EventId) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM orders WHERE event_id = $1 AND status <> 'cancelled'",
        )
        .bind(*event_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to count orders", &e))?;
        u64::try_from(count).map_err(|_| out_of_range("order count"))
    }

    async fn purge_cancelled_for_event(&self, event_id: EventId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM orders WHERE event_id = $1 AND status = 'cancelled'")
            .bind(*event_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to purge cancelled orders", &e))?;
        Ok(result.rows_affected())
    }
}
