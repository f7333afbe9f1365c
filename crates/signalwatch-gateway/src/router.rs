//! Axum router wiring: dashboard page, JSON API, WebSocket, ops endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{api, app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::index))
        .route("/api/snapshot", get(api::snapshot))
        .route("/api/refresh", post(api::refresh))
        .route(
            "/api/auto-refresh",
            get(api::get_auto_refresh).put(api::set_auto_refresh),
        )
        .route("/api/auto-refresh/toggle", post(api::toggle_auto_refresh))
        .route("/api/junctions", get(api::junctions))
        .route("/api/signals", get(api::signals))
        .route("/v1/ws", get(transport::ws::ws_upgrade))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
