//! `PostgreSQL` stores for the boxoffice ticketing backend.
//!
//! Implements the store traits from `boxoffice-core` on top of sqlx:
//!
//! - [`PostgresEventStore`]: `InventoryStore` + `EventRepository`. The
//!   availability decrement is a single conditional `UPDATE`, so concurrent
//!   purchases cannot oversell.
//! - [`PostgresOrderLedger`]: `OrderLedger`. Status transitions lock the order
//!   row for the read-validate-write sequence.
//!
//! Queries are checked at runtime (`sqlx::query_as` + `bind`), so building
//! does not need a live database.
//!
//! # Example
//!
//! ```ignore
//! use boxoffice_postgres::{PostgresEventStore, PostgresOrderLedger, migrate};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = sqlx::PgPool::connect("postgres://localhost/boxoffice").await?;
//!     migrate(&pool).await?;
//!     let events = PostgresEventStore::new(pool.clone());
//!     let orders = PostgresOrderLedger::new(pool);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod events;
mod orders;

pub use events::PostgresEventStore;
pub use orders::PostgresOrderLedger;

use boxoffice_core::error::{OrderError, Result};
use sqlx::PgPool;

/// Run the bundled database migrations.
///
/// # Errors
///
/// Returns [`OrderError::StoreFailure`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| OrderError::StoreFailure(format!("Migration failed: {e}")))?;
    tracing::info!("Database migrations applied");
    Ok(())
}

pub(crate) fn db_error(context: &str, error: &sqlx::Error) -> OrderError {
    OrderError::StoreFailure(format!("{context}: {error}"))
}

pub(crate) fn out_of_range(field: &str) -> OrderError {
    OrderError::StoreFailure(format!("{field} out of range for storage"))
}
