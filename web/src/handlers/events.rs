//! Public event endpoints.
//!
//! - `GET /api/events` - published events (`?search=&featured=&sort=&order=&limit=`)
//! - `GET /api/events/featured` - featured published events, soonest first
//! - `GET /api/events/:id` - a published event

use super::{EventListResponse, ListEventsParams};
use crate::WebResult;
use crate::extractors::{ApiPath, ApiQuery};
use crate::state::AppState;
use axum::{Json, extract::State};
use boxoffice_core::{Event, EventId, EventQuery, EventRepository, InventoryStore, OrderLedger};
use uuid::Uuid;

/// List published events.
///
/// ```bash
/// curl 'http://localhost:8080/api/events?search=jazz&sort=starts_at&order=asc'
/// ```
///
/// # Errors
///
/// 500 if the store fails.
pub async fn list_events<R, L>(
    State(state): State<AppState<R, L>>,
    ApiQuery(params): ApiQuery<ListEventsParams>,
) -> WebResult<Json<EventListResponse>>
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    let events = state
        .catalog
        .list_published(params.apply_to(EventQuery::published()))
        .await?;
    Ok(Json(events.into()))
}

/// List featured published events.
///
/// # Errors
///
/// 500 if the store fails.
pub async fn featured_events<R, L>(
    State(state): State<AppState<R, L>>,
) -> WebResult<Json<EventListResponse>>
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    Ok(Json(state.catalog.featured().await?.into()))
}

/// Get a published event.
///
/// # Errors
///
/// 404 if the event does not exist or is not published.
pub async fn get_event<R, L>(
    State(state): State<AppState<R, L>>,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<Json<Event>>
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    let event = state.catalog.get_published(EventId::from_uuid(id)).await?;
    Ok(Json(event))
}
