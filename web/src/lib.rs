//! HTTP API for the boxoffice ticketing backend.
//!
//! A thin Axum shell over `boxoffice-core`: handlers resolve the caller from
//! the bearer token, call the workflow or catalog, and map [`OrderError`]s to
//! HTTP responses through [`AppError`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Axum shell (this crate)      │  ← routing, JSON, sessions
//! │  - CurrentActor from Bearer token       │  ← correlation IDs, tracing
//! │  - AppError from OrderError             │
//! ├─────────────────────────────────────────┤
//! │            boxoffice-core               │
//! │  - OrderWorkflow / EventCatalog         │  ← authorization, validation
//! │  - store traits                         │  ← in-memory or PostgreSQL
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use boxoffice_web::{AppState, SessionDirectory, build_router};
//!
//! let state = AppState::new(events, orders, config.ordering.policy(), sessions);
//! let app = build_router(state);
//! axum::serve(listener, app).await?;
//! ```
//!
//! [`OrderError`]: boxoffice_core::OrderError

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;

pub use config::{Config, ConfigError};
pub use error::AppError;
pub use extractors::{ApiJson, ApiPath, ApiQuery};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationId, correlation_id_layer};
pub use routes::build_router;
pub use session::{CurrentActor, SessionDirectory};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
