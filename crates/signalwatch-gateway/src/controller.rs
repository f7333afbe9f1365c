//! Refresh controller: owns the current snapshot and the auto-refresh timer.
//!
//! The current view is published through a `watch` channel; HTTP handlers and
//! WebSocket sessions only ever read it. Every refresh builds a brand new
//! `Snapshot` and swaps it in wholesale.
//!
//! Auto-refresh is a single cancellable ticker task. Enabling it schedules the
//! first tick one full interval out; disabling aborts the task. Each ticker
//! carries the epoch it was started under and re-checks it under the same
//! lock `set_auto_refresh` takes, so no timer refresh lands after a disable
//! has returned. After `shutdown` the controller is draining and will not
//! enable the timer again.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use signalwatch_core::error::{Result, SignalWatchError};
use signalwatch_core::generator::{generate, Clock};
use signalwatch_core::model::{JunctionSet, Snapshot};
use signalwatch_core::plan::{signal_report, SignalReport};

use crate::obs::DashboardMetrics;

/// What caused a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Initial,
    Manual,
    Timer,
}

impl RefreshTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            RefreshTrigger::Initial => "initial",
            RefreshTrigger::Manual => "manual",
            RefreshTrigger::Timer => "timer",
        }
    }
}

/// Read-only view handed to the display layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Bumped on every published snapshot.
    pub seq: u64,
    pub auto_refresh: bool,
    pub interval_ms: u64,
    pub snapshot: Arc<Snapshot>,
}

struct AutoRefresh {
    enabled: bool,
    /// Set by `shutdown`; enabling is refused from then on.
    draining: bool,
    epoch: u64,
    ticker: Option<JoinHandle<()>>,
}

pub struct RefreshController {
    junctions: Arc<JunctionSet>,
    clock: Arc<dyn Clock>,
    rng: Mutex<ChaCha8Rng>,
    interval: Duration,
    auto: Mutex<AutoRefresh>,
    tx: watch::Sender<DashboardView>,
    metrics: Arc<DashboardMetrics>,
}

/// Recover the guard from a poisoned lock; the guarded state stays consistent
/// because no code path panics while holding it.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RefreshController {
    /// Build the controller and produce the initial snapshot.
    ///
    /// Auto-refresh starts disabled; call `set_auto_refresh(true)` from inside
    /// a Tokio runtime to start the timer.
    pub fn new(
        junctions: JunctionSet,
        clock: Arc<dyn Clock>,
        seed: Option<u64>,
        interval: Duration,
        metrics: Arc<DashboardMetrics>,
    ) -> Result<Arc<Self>> {
        if interval.is_zero() {
            return Err(SignalWatchError::Config("refresh interval must be non-zero".into()));
        }

        let mut rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };

        let started = Instant::now();
        let snapshot = generate(&junctions, clock.now(), &mut rng);
        metrics.refresh_duration.observe(&[], started.elapsed());
        metrics.refreshes.inc(&[("trigger", RefreshTrigger::Initial.as_str())]);

        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        let (tx, _rx) = watch::channel(DashboardView {
            seq: 1,
            auto_refresh: false,
            interval_ms,
            snapshot: Arc::new(snapshot),
        });

        tracing::info!(junctions = junctions.len(), interval_ms, seeded = seed.is_some(), "refresh controller ready");

        Ok(Arc::new(Self {
            junctions: Arc::new(junctions),
            clock,
            rng: Mutex::new(rng),
            interval,
            auto: Mutex::new(AutoRefresh {
                enabled: false,
                draining: false,
                epoch: 0,
                ticker: None,
            }),
            tx,
            metrics,
        }))
    }

    pub fn junctions(&self) -> &JunctionSet {
        &self.junctions
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current view (cheap clone: the snapshot is shared).
    pub fn current(&self) -> DashboardView {
        self.tx.borrow().clone()
    }

    /// Read-only subscription; the receiver sees the current view as already seen.
    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.tx.subscribe()
    }

    pub fn auto_refresh(&self) -> bool {
        lock(&self.auto).enabled
    }

    pub fn is_draining(&self) -> bool {
        lock(&self.auto).draining
    }

    /// Generate a new snapshot and publish it. Never touches the auto-refresh flag.
    pub fn refresh(&self, trigger: RefreshTrigger) -> DashboardView {
        let started = Instant::now();
        let snapshot = {
            let mut rng = lock(&self.rng);
            generate(&self.junctions, self.clock.now(), &mut *rng)
        };
        self.metrics.refresh_duration.observe(&[], started.elapsed());
        self.metrics.refreshes.inc(&[("trigger", trigger.as_str())]);

        tracing::debug!(
            trigger = trigger.as_str(),
            total_vehicles = snapshot.total_vehicles,
            avg_congestion = snapshot.avg_congestion,
            "snapshot refreshed"
        );

        let snapshot = Arc::new(snapshot);
        self.tx.send_modify(|view| {
            view.seq += 1;
            view.snapshot = snapshot;
        });
        self.current()
    }

    /// Enable or disable automatic refresh. Returns the new state.
    ///
    /// Enabling requires a Tokio runtime (the ticker is a spawned task) and is
    /// refused with `NotAllowed` once `shutdown` has run.
    pub fn set_auto_refresh(self: &Arc<Self>, enabled: bool) -> Result<bool> {
        let mut auto = lock(&self.auto);
        self.apply(&mut auto, enabled)
    }

    /// Flip automatic refresh. Returns the new state.
    pub fn toggle_auto_refresh(self: &Arc<Self>) -> Result<bool> {
        let mut auto = lock(&self.auto);
        let target = !auto.enabled;
        self.apply(&mut auto, target)
    }

    fn apply(self: &Arc<Self>, auto: &mut AutoRefresh, enabled: bool) -> Result<bool> {
        if auto.enabled == enabled {
            return Ok(enabled);
        }

        if enabled {
            if auto.draining {
                return Err(SignalWatchError::NotAllowed(
                    "auto-refresh cannot be enabled while draining".into(),
                ));
            }
            let handle = tokio::runtime::Handle::try_current().map_err(|e| {
                SignalWatchError::Internal(format!("auto-refresh needs a tokio runtime: {e}"))
            })?;
            auto.epoch += 1;
            auto.ticker = Some(handle.spawn(run_ticker(Arc::downgrade(self), auto.epoch, self.interval)));
        } else if let Some(ticker) = auto.ticker.take() {
            ticker.abort();
        }
        auto.enabled = enabled;

        self.tx.send_modify(|view| view.auto_refresh = enabled);
        self.metrics
            .auto_refresh_changes
            .inc(&[("enabled", if enabled { "true" } else { "false" })]);
        tracing::info!(enabled, "auto-refresh changed");

        Ok(enabled)
    }

    /// Signal timing plans and network metrics for the current snapshot.
    pub fn signal_report(&self) -> SignalReport {
        let snapshot = Arc::clone(&self.tx.borrow().snapshot);
        let mut rng = lock(&self.rng);
        signal_report(&snapshot, &mut *rng)
    }

    /// Stop the ticker, if any, and refuse to start it again. Used on shutdown.
    pub fn shutdown(&self) {
        let mut auto = lock(&self.auto);
        if let Some(ticker) = auto.ticker.take() {
            ticker.abort();
        }
        auto.draining = true;
        auto.enabled = false;
        auto.epoch += 1;
        self.tx.send_modify(|view| view.auto_refresh = false);
    }

    /// Timer callback: refresh only if this ticker is still the live one.
    fn tick(&self, epoch: u64) -> bool {
        let auto = lock(&self.auto);
        if !auto.enabled || auto.epoch != epoch {
            return false;
        }
        self.refresh(RefreshTrigger::Timer);
        true
    }
}

impl Drop for RefreshController {
    fn drop(&mut self) {
        if let Some(ticker) = lock(&self.auto).ticker.take() {
            ticker.abort();
        }
    }
}

async fn run_ticker(controller: Weak<RefreshController>, epoch: u64, period: Duration) {
    let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;
        let Some(this) = controller.upgrade() else { break; };
        if !this.tick(epoch) {
            break;
        }
    }
    tracing::debug!(epoch, "auto-refresh ticker stopped");
}
