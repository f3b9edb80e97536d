//! Order endpoints for the logged-in customer.
//!
//! - `POST /api/orders` - buy tickets
//! - `GET /api/orders` - own orders, newest first
//! - `GET /api/orders/:id` - one order (owner or admin)
//! - `POST /api/orders/:id/cancel` - cancel and release the tickets

use super::OrderListResponse;
use crate::WebResult;
use crate::error::AppError;
use crate::extractors::{ApiJson, ApiPath};
use crate::session::CurrentActor;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use boxoffice_core::{
    EventId, EventRepository, InventoryStore, Order, OrderId, OrderLedger, require_authenticated,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to buy tickets.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// Event to buy tickets for
    pub event_id: Uuid,
    /// Number of tickets; validated by the workflow, so any integer is accepted here
    pub quantity: i64,
}

/// Buy tickets.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/orders \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{"event_id": "550e8400-e29b-41d4-a716-446655440000", "quantity": 2}'
/// ```
///
/// # Errors
///
/// 401 when anonymous (checked before the body is read), 422 for a bad
/// quantity or a malformed body, 404 for an unknown event, 409 when too few
/// tickets remain.
pub async fn create_order<R, L>(
    State(state): State<AppState<R, L>>,
    CurrentActor(actor): CurrentActor,
    body: Result<ApiJson<CreateOrderRequest>, AppError>,
) -> WebResult<(StatusCode, Json<Order>)>
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    require_authenticated(&actor)?;
    let ApiJson(request) = body?;

    let order = state
        .workflow
        .create_order(&actor, EventId::from_uuid(request.event_id), request.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List the caller's orders.
///
/// # Errors
///
/// 401 when anonymous.
pub async fn list_my_orders<R, L>(
    State(state): State<AppState<R, L>>,
    CurrentActor(actor): CurrentActor,
) -> WebResult<Json<OrderListResponse>>
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    Ok(Json(state.workflow.list_my_orders(&actor).await?.into()))
}

/// Get one order.
///
/// # Errors
///
/// 400 for a malformed id, 401 when anonymous, 403 for someone else's order,
/// 404 if missing.
pub async fn get_order<R, L>(
    State(state): State<AppState<R, L>>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<Json<Order>>
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    let order = state
        .workflow
        .get_order(&actor, OrderId::from_uuid(id))
        .await?;
    Ok(Json(order))
}

/// Cancel an order.
///
/// # Errors
///
/// 401 when anonymous, 403 for someone else's order, 404 if missing,
/// 409 if it is already cancelled.
pub async fn cancel_order<R, L>(
    State(state): State<AppState<R, L>>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<Uuid>,
) -> WebResult<Json<Order>>
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    let order = state
        .workflow
        .cancel_order(&actor, OrderId::from_uuid(id))
        .await?;
    Ok(Json(order))
}
