//! Shared application state for the signalwatch gateway.
//!
//! Wires the refresh controller, the service dispatcher, and metrics. Startup
//! errors (bad junction list, no runtime for the ticker) come back as `Result`.

use std::sync::Arc;
use std::time::Duration;

use signalwatch_core::error::Result;
use signalwatch_core::generator::{Clock, LocalClock};
use signalwatch_core::network::RoadNetwork;

use crate::config::GatewayConfig;
use crate::controller::RefreshController;
use crate::dispatch::Dispatcher;
use crate::obs::DashboardMetrics;
use crate::services::TrafficService;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    controller: Arc<RefreshController>,
    roads: RoadNetwork,
    dispatcher: Dispatcher,
    metrics: Arc<DashboardMetrics>,
}

impl AppState {
    /// Build application state with the system local clock.
    /// Must be called inside a Tokio runtime when `refresh.auto_start` is set.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        Self::with_clock(cfg, Arc::new(LocalClock))
    }

    pub fn with_clock(cfg: GatewayConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let metrics = Arc::new(DashboardMetrics::default());

        let junctions = cfg.junction_set()?;
        let roads = cfg.road_network(&junctions)?;
        let controller = RefreshController::new(
            junctions,
            clock,
            cfg.refresh.seed,
            Duration::from_millis(cfg.refresh.interval_ms),
            Arc::clone(&metrics),
        )?;
        controller.set_auto_refresh(cfg.refresh.auto_start)?;

        let dispatcher = Dispatcher::new();
        dispatcher.register_text(Arc::new(TrafficService::new()));
        tracing::debug!(svcs = ?dispatcher.registered_text_svcs(), "services registered");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                controller,
                roads,
                dispatcher,
                metrics,
            }),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn controller(&self) -> Arc<RefreshController> {
        Arc::clone(&self.inner.controller)
    }

    pub fn roads(&self) -> &RoadNetwork {
        &self.inner.roads
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn metrics(&self) -> &DashboardMetrics {
        &self.inner.metrics
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Mark draining (readyz -> 503) and stop the auto-refresh timer for good.
    pub fn begin_drain(&self) {
        self.inner.metrics.set_draining();
        self.inner.controller.shutdown();
    }

    /// Live gauges taken from the current view, appended to `/metrics`.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        let view = self.inner.controller.current();
        vec![
            ("signalwatch_snapshot_seq", view.seq),
            ("signalwatch_total_vehicles", view.snapshot.total_vehicles),
            ("signalwatch_avg_congestion_pct", u64::from(view.snapshot.avg_congestion)),
            ("signalwatch_active_junctions", view.snapshot.active_junctions as u64),
            ("signalwatch_auto_refresh_enabled", u64::from(view.auto_refresh)),
        ]
    }
}
