//! Synthetic traffic-metrics generator.
//!
//! `generate` is total and side-effect free: wall-clock time and the random
//! source are passed in, a fresh `Snapshot` comes out. Callers decide where
//! the time and randomness come from (see `Clock`).

use chrono::{Local, NaiveDateTime, Timelike};
use rand::Rng;

use crate::model::{
    congestion_pct, JunctionReading, JunctionSet, SignalState, Snapshot,
    ACTIVE_VEHICLE_THRESHOLD,
};

/// Lower bound of the per-junction base count draw.
pub const BASE_COUNT_MIN: u32 = 20;
/// Width of the base count draw, `[20, 50)`.
pub const BASE_COUNT_SPAN: u32 = 30;
/// Lower bound of the jitter multiplier, `[0.8, 1.2)`.
pub const JITTER_MIN: f64 = 0.8;
pub const JITTER_SPAN: f64 = 0.4;

/// Traffic intensity band derived from the local hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    RushHour,
    Daytime,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            7..=9 | 16..=18 => TimeOfDay::RushHour,
            10..=15 => TimeOfDay::Daytime,
            _ => TimeOfDay::Night,
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            TimeOfDay::RushHour => 2.5,
            TimeOfDay::Daytime => 1.5,
            TimeOfDay::Night => 0.3,
        }
    }
}

/// Wall-clock source for the generator's callers.
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// System local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Vehicle count for one junction: `floor(base * factor * time_factor * jitter)`.
///
/// Draws the base count first, then the jitter.
pub fn vehicle_count<R: Rng + ?Sized>(base_congestion: f64, time_factor: f64, rng: &mut R) -> u32 {
    let base = (rng.gen::<f64>() * f64::from(BASE_COUNT_SPAN)).floor() + f64::from(BASE_COUNT_MIN);
    let jitter = JITTER_MIN + rng.gen::<f64>() * JITTER_SPAN;
    let raw = (base * base_congestion * time_factor * jitter).floor();
    // factors are validated non-negative; the max() only guards the cast
    raw.max(0.0) as u32
}

/// Produce one snapshot for every configured junction, in configuration order.
pub fn generate<R: Rng + ?Sized>(
    junctions: &JunctionSet,
    now: NaiveDateTime,
    rng: &mut R,
) -> Snapshot {
    let time_factor = TimeOfDay::from_hour(now.hour()).factor();
    let minute_stamp = now.format("%H:%M").to_string();

    let mut total_vehicles: u64 = 0;
    let mut total_congestion: u64 = 0;
    let mut active_junctions = 0;
    let mut readings = Vec::with_capacity(junctions.len());

    for junction in junctions {
        let vehicles = vehicle_count(junction.base_congestion, time_factor, rng);
        let congestion = congestion_pct(vehicles);
        let signal = SignalState::from_congestion(congestion);

        total_vehicles += u64::from(vehicles);
        total_congestion += u64::from(congestion);
        if vehicles > ACTIVE_VEHICLE_THRESHOLD {
            active_junctions += 1;
        }

        readings.push(JunctionReading {
            junction_id: junction.id.clone(),
            name: junction.name.clone(),
            vehicles,
            congestion_pct: congestion,
            signal,
            signal_color: signal.color(),
            last_update: minute_stamp.clone(),
        });
    }

    // JunctionSet is never empty, and the mean of values <= 100 fits in u8.
    let avg_congestion = (total_congestion / readings.len() as u64) as u8;

    Snapshot {
        total_vehicles,
        avg_congestion,
        active_junctions,
        junctions: readings,
        taken_at: now,
        last_update: now.format("%H:%M:%S").to_string(),
    }
}
