//! API layer - HTTP and WebSocket entry points.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::app::App;

pub mod connections;
pub mod http;
pub mod websocket;

#[cfg(test)]
pub(crate) mod test_support;

/// Build the full router: health check plus the `/ws` protocol endpoint.
pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .merge(http::routes())
        .route("/ws", get(websocket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}
