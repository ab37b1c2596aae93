//! HTTP router.
//!
//! Returns a composable `Router` with REST endpoints under `/api/` and
//! the change-notice WebSocket at `/ws/updates`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::types::AppContext;
use crate::api::websocket;

/// Build the service router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: AppContext) -> Router {
    let api = Router::new()
        .route("/process", post(endpoints::process::run))
        .route(
            "/documents",
            post(endpoints::documents::register).get(endpoints::documents::list),
        )
        .route("/documents/:id", get(endpoints::documents::detail))
        .route("/events", get(endpoints::events::list))
        .route("/events/:id", delete(endpoints::events::delete))
        .with_state(ctx.clone());

    let ws_routes = Router::new()
        .route("/ws/updates", get(websocket::ws_upgrade))
        .with_state(ctx);

    Router::new().nest("/api", api).merge(ws_routes)
}
