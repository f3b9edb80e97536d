//! Admin endpoints. Every call goes through the workflow or catalog, which
//! reject non-admin callers. Handlers with a body also check the caller
//! before reading it, so anonymous requests get 401 rather than a body error.
//!
//! - `GET /api/admin/events`, `POST /api/admin/events`
//! - `PUT /api/admin/events/:id`, `DELETE /api/admin/events/:id`
//! - `GET /api/admin/orders`
//! - `PUT /api/admin/orders/:id/status`

use super::{EventListResponse, ListEventsParams, OrderListResponse};
use crate::WebResult;
use crate::error::AppError;
use crate::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::session::CurrentActor;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use boxoffice_core::{
    Event, EventId, EventQuery, EventRepository, EventUpdate, InventoryStore, NewEvent, Order,
    OrderId, OrderLedger, OrderStatus, require_admin,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to change an order's status.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target status
    pub status: OrderStatus,
}

/// List every event, published or not.
///
/// # Errors
///
/// 401/403 for non-admins.
pub async fn list_events<R, L>(
    State(state): State<AppState<R, L>>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(params): ApiQuery<ListEventsParams>,
) -> WebResult<Json<EventListResponse>>
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    let events = state
        .catalog
        .list_all(&actor, params.apply_to(EventQuery::default()))
        .await?;
    Ok(Json(events.into()))
}

/// Create an event.
///
/// # Errors
///
/// 401/403 for non-admins, 422 for invalid input.
pub async fn create_event<R, L>(
    State(state): State<AppState<R, L>>,
    CurrentActor(actor): CurrentActor,
    body: Result<ApiJson<NewEvent>, AppError>,
) -> WebResult<(StatusCode, Json<Event>)>
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    require_admin(&actor)?;
    let ApiJson(new) = body?;

    let event = state.catalog.create_event(&actor, new).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Update an event.
///
/// # Errors
///
/// 401/403 for non-admins, 404 if missing, 422 for invalid input.
pub async fn update_event<R, L>(
    State(state): State<AppState<R, L>>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<Uuid>,
    body: Result<ApiJson<EventUpdate>, AppError>,
) -> WebResult<Json<Event>>
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    require_admin(&actor)?;
    let ApiJson(update) = body?;

    let event = state
        .catalog
        .update_event(&actor, EventId::from_uuid(id), update)
        .await?;
    Ok(Json(event))
}

/// Delete an event.
///
/// # Errors
///
/// 401/403 for non-admins, 404 if missing, 409 while active orders exist.
pub async fn delete_event<R, L>(
    State(state): State<AppState<R, L>>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<StatusCode>
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    state
        .catalog
        .delete_event(&actor, EventId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List every order, newest first.
///
/// # Errors
///
/// 401/403 for non-admins.
pub async fn list_orders<R, L>(
    State(state): State<AppState<R, L>>,
    CurrentActor(actor): CurrentActor,
) -> WebResult<Json<OrderListResponse>>
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    Ok(Json(state.workflow.list_all_orders(&actor).await?.into()))
}

/// Move an order to another status.
///
/// # Errors
///
/// 401/403 for non-admins, 404 if missing, 409 for a disallowed transition.
pub async fn update_order_status<R, L>(
    State(state): State<AppState<R, L>>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<Uuid>,
    body: Result<ApiJson<UpdateStatusRequest>, AppError>,
) -> WebResult<Json<Order>>
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    require_admin(&actor)?;
    let ApiJson(request) = body?;

    let order = state
        .workflow
        .update_order_status(&actor, OrderId::from_uuid(id), request.status)
        .await?;
    Ok(Json(order))
}
