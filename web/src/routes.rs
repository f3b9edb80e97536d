//! Router configuration.

use crate::handlers::{admin, events, health, orders};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};
use boxoffice_core::{EventRepository, InventoryStore, OrderLedger};
use tower_http::trace::TraceLayer;

/// Build the complete router.
///
/// ```text
/// GET    /health
/// GET    /api/events
/// GET    /api/events/featured
/// GET    /api/events/:id
/// POST   /api/orders
/// GET    /api/orders
/// GET    /api/orders/:id
/// POST   /api/orders/:id/cancel
/// GET    /api/admin/events
/// POST   /api/admin/events
/// PUT    /api/admin/events/:id
/// DELETE /api/admin/events/:id
/// GET    /api/admin/orders
/// PUT    /api/admin/orders/:id/status
/// ```
pub fn build_router<R, L>(state: AppState<R, L>) -> Router
where
    R: EventRepository + InventoryStore + 'static,
    L: OrderLedger + 'static,
{
    let admin_routes = Router::new()
        .route(
            "/events",
            get(admin::list_events::<R, L>).post(admin::create_event::<R, L>),
        )
        .route(
            "/events/:id",
            put(admin::update_event::<R, L>).delete(admin::delete_event::<R, L>),
        )
        .route("/orders", get(admin::list_orders::<R, L>))
        .route(
            "/orders/:id/status",
            put(admin::update_order_status::<R, L>),
        );

    let api_routes = Router::new()
        .route("/events", get(events::list_events::<R, L>))
        .route("/events/featured", get(events::featured_events::<R, L>))
        .route("/events/:id", get(events::get_event::<R, L>))
        .route(
            "/orders",
            post(orders::create_order::<R, L>).get(orders::list_my_orders::<R, L>),
        )
        .route("/orders/:id", get(orders::get_order::<R, L>))
        .route("/orders/:id/cancel", post(orders::cancel_order::<R, L>))
        .nest("/admin", admin_routes);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
