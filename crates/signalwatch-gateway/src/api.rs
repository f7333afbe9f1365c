//! Dashboard HTTP API.
//!
//! - `GET  /api/snapshot`             : current view
//! - `POST /api/refresh`              : manual refresh
//! - `GET  /api/auto-refresh`         : auto-refresh state
//! - `PUT  /api/auto-refresh`         : set auto-refresh (`{"enabled": bool}`)
//! - `POST /api/auto-refresh/toggle`  : flip auto-refresh
//! - `GET  /api/junctions`            : static junction config and road network
//! - `GET  /api/signals`              : signal timing plans and network metrics for the current snapshot

use axum::{extract::State, response::Html, Json};
use serde::{Deserialize, Serialize};

use signalwatch_core::model::{Junction, JUNCTION_CAPACITY};
use signalwatch_core::network::Road;
use signalwatch_core::plan::{NetworkMetrics, SignalPlan};

use crate::app_state::AppState;
use crate::controller::{DashboardView, RefreshTrigger};
use crate::error::ApiResult;

const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoRefreshStatus {
    pub enabled: bool,
    pub interval_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetAutoRefresh {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub total_junctions: usize,
    pub total_roads: usize,
    pub average_capacity: u32,
    pub mean_base_congestion: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JunctionsResponse {
    pub junctions: Vec<Junction>,
    pub road_network: Vec<Road>,
    pub network_stats: NetworkStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalsResponse {
    pub snapshot_seq: u64,
    pub last_update: String,
    pub network_metrics: NetworkMetrics,
    pub plans: Vec<SignalPlan>,
}

fn auto_status(state: &AppState) -> AutoRefreshStatus {
    let view = state.controller().current();
    AutoRefreshStatus {
        enabled: view.auto_refresh,
        interval_ms: view.interval_ms,
    }
}

pub async fn index() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

pub async fn snapshot(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.controller().current())
}

pub async fn refresh(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.controller().refresh(RefreshTrigger::Manual))
}

pub async fn get_auto_refresh(State(state): State<AppState>) -> Json<AutoRefreshStatus> {
    Json(auto_status(&state))
}

pub async fn set_auto_refresh(
    State(state): State<AppState>,
    Json(req): Json<SetAutoRefresh>,
) -> ApiResult<Json<AutoRefreshStatus>> {
    state.controller().set_auto_refresh(req.enabled)?;
    Ok(Json(auto_status(&state)))
}

pub async fn toggle_auto_refresh(State(state): State<AppState>) -> ApiResult<Json<AutoRefreshStatus>> {
    state.controller().toggle_auto_refresh()?;
    Ok(Json(auto_status(&state)))
}

pub async fn junctions(State(state): State<AppState>) -> Json<JunctionsResponse> {
    let controller = state.controller();
    let set = controller.junctions();
    let roads = state.roads();
    Json(JunctionsResponse {
        junctions: set.as_slice().to_vec(),
        road_network: roads.as_slice().to_vec(),
        network_stats: NetworkStats {
            total_junctions: set.len(),
            total_roads: roads.len(),
            average_capacity: JUNCTION_CAPACITY,
            mean_base_congestion: set.mean_base_congestion(),
        },
    })
}

pub async fn signals(State(state): State<AppState>) -> Json<SignalsResponse> {
    let controller = state.controller();
    let view = controller.current();
    let report = controller.signal_report();
    Json(SignalsResponse {
        snapshot_seq: view.seq,
        last_update: view.snapshot.last_update.clone(),
        network_metrics: report.network_metrics,
        plans: report.plans,
    })
}
