//! Rule-based signal timing plans derived from a snapshot.
//!
//! Each junction gets a four-phase cycle picked by its signal state, with a
//! small per-phase jitter so consecutive plans look adaptive. A report adds
//! network-wide figures over all plans.

use rand::Rng;
use serde::Serialize;

use crate::model::{SignalState, Snapshot};

pub const PHASE_JITTER_MIN: f64 = 0.95;
pub const PHASE_JITTER_SPAN: f64 = 0.10;

pub const PREDICTION_MIN: f64 = 0.9;
pub const PREDICTION_SPAN: f64 = 0.2;

pub const SCORE_MIN: f64 = 0.7;
pub const SCORE_SPAN: f64 = 0.25;

/// Inclusive range of the advertised wait-time reduction, in percent.
pub const WAIT_REDUCTION_PCT: std::ops::RangeInclusive<u32> = 15..=40;

/// Recommended cycle for one junction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalPlan {
    pub junction_id: String,
    pub junction_name: String,
    pub congestion_pct: u8,
    /// Congestion fraction expected next cycle, three decimals.
    pub predicted_congestion: f64,
    pub signal: SignalState,
    /// Seconds per phase, one decimal.
    pub phase_durations: [f64; 4],
    pub total_cycle_secs: f64,
    pub recommended_action: &'static str,
    /// In `[0.7, 0.95)`, two decimals.
    pub optimization_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMetrics {
    /// Mean congestion fraction over all plans, three decimals.
    pub average_congestion: f64,
    /// `(1 - average) * 100`, one decimal, with a `%` suffix.
    pub network_efficiency: String,
    pub total_signals_optimized: usize,
    pub predicted_wait_time_reduction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalReport {
    pub network_metrics: NetworkMetrics,
    pub plans: Vec<SignalPlan>,
}

/// Nominal phase split in seconds.
pub fn base_phases(signal: SignalState) -> [f64; 4] {
    match signal {
        SignalState::Red => [40.0, 20.0, 15.0, 25.0],
        SignalState::Yellow => [30.0, 30.0, 20.0, 20.0],
        SignalState::Green => [25.0, 25.0, 25.0, 25.0],
    }
}

pub fn recommended_action(signal: SignalState) -> &'static str {
    match signal {
        SignalState::Red => "High traffic: extend main road green time by 25%",
        SignalState::Yellow => "Medium traffic: maintain balanced signal timing",
        SignalState::Green => "Low traffic: optimize for pedestrian crossing",
    }
}

fn round_to(v: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (v * scale).round() / scale
}

fn round1(v: f64) -> f64 {
    round_to(v, 1)
}

/// One plan per reading, in snapshot order.
pub fn plan_signals<R: Rng + ?Sized>(snapshot: &Snapshot, rng: &mut R) -> Vec<SignalPlan> {
    snapshot
        .junctions
        .iter()
        .map(|reading| {
            let mut phases = base_phases(reading.signal);
            for p in phases.iter_mut() {
                let jitter = PHASE_JITTER_MIN + rng.gen::<f64>() * PHASE_JITTER_SPAN;
                *p *= jitter;
            }
            let total = round1(phases.iter().sum());
            let congestion = f64::from(reading.congestion_pct) / 100.0;
            let predicted = congestion * (PREDICTION_MIN + rng.gen::<f64>() * PREDICTION_SPAN);
            let score = SCORE_MIN + rng.gen::<f64>() * SCORE_SPAN;

            SignalPlan {
                junction_id: reading.junction_id.clone(),
                junction_name: reading.name.clone(),
                congestion_pct: reading.congestion_pct,
                predicted_congestion: round_to(predicted, 3),
                signal: reading.signal,
                phase_durations: phases.map(round1),
                total_cycle_secs: total,
                recommended_action: recommended_action(reading.signal),
                optimization_score: round_to(score, 2),
            }
        })
        .collect()
}

/// Network-wide figures over a set of plans. An empty slice averages to 0.
pub fn network_metrics<R: Rng + ?Sized>(plans: &[SignalPlan], rng: &mut R) -> NetworkMetrics {
    let average = if plans.is_empty() {
        0.0
    } else {
        let sum: f64 = plans.iter().map(|p| f64::from(p.congestion_pct) / 100.0).sum();
        sum / plans.len() as f64
    };
    let efficiency = round1((1.0 - average) * 100.0);

    NetworkMetrics {
        average_congestion: round_to(average, 3),
        network_efficiency: format!("{efficiency:.1}%"),
        total_signals_optimized: plans.len(),
        predicted_wait_time_reduction: format!("{}%", rng.gen_range(WAIT_REDUCTION_PCT)),
    }
}

/// Plans for every junction plus the network block, from one RNG stream.
pub fn signal_report<R: Rng + ?Sized>(snapshot: &Snapshot, rng: &mut R) -> SignalReport {
    let plans = plan_signals(snapshot, rng);
    SignalReport {
        network_metrics: network_metrics(&plans, rng),
        plans,
    }
}
