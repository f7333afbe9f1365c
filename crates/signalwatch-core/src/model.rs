//! Junction configuration and the per-refresh reading/snapshot types.
//!
//! `JunctionSet` is validated once at startup and never changes afterwards.
//! `Snapshot` values are immutable; each refresh builds a new one.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalWatchError};

/// Vehicle count that maps to 100% congestion.
pub const JUNCTION_CAPACITY: u32 = 60;

/// Readings with more vehicles than this count as active.
pub const ACTIVE_VEHICLE_THRESHOLD: u32 = 5;

/// Congestion above this is RED.
pub const RED_ABOVE_PCT: u8 = 70;

/// Congestion above this (and not RED) is YELLOW.
pub const YELLOW_ABOVE_PCT: u8 = 40;

/// A fixed, named traffic intersection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Junction {
    pub id: String,
    pub name: String,
    /// Static load factor in `[0, 1]`.
    pub base_congestion: f64,
}

impl Junction {
    pub fn new(id: impl Into<String>, name: impl Into<String>, base_congestion: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_congestion,
        }
    }
}

/// Validated, ordered, non-empty junction list.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionSet {
    junctions: Vec<Junction>,
}

impl JunctionSet {
    /// Validate and freeze a junction list.
    ///
    /// Rejects an empty list, blank or duplicate ids, and base congestion
    /// factors outside `[0, 1]`.
    pub fn new(junctions: Vec<Junction>) -> Result<Self> {
        if junctions.is_empty() {
            return Err(SignalWatchError::Config(
                "junction list must not be empty".into(),
            ));
        }

        let mut seen = HashSet::with_capacity(junctions.len());
        for j in &junctions {
            if j.id.trim().is_empty() {
                return Err(SignalWatchError::Config("junction id must not be blank".into()));
            }
            if !seen.insert(j.id.as_str()) {
                return Err(SignalWatchError::Config(format!(
                    "duplicate junction id: {}",
                    j.id
                )));
            }
            if !j.base_congestion.is_finite() || !(0.0..=1.0).contains(&j.base_congestion) {
                return Err(SignalWatchError::Config(format!(
                    "junction {} base_congestion must be within [0, 1], got {}",
                    j.id, j.base_congestion
                )));
            }
        }

        Ok(Self { junctions })
    }

    /// The five demo junctions.
    pub fn builtin() -> Self {
        Self {
            junctions: builtin_junctions(),
        }
    }

    pub fn as_slice(&self) -> &[Junction] {
        &self.junctions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Junction> {
        self.junctions.iter()
    }

    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }

    /// Arithmetic mean of the base congestion factors.
    pub fn mean_base_congestion(&self) -> f64 {
        let sum: f64 = self.junctions.iter().map(|j| j.base_congestion).sum();
        sum / self.junctions.len() as f64
    }
}

impl<'a> IntoIterator for &'a JunctionSet {
    type Item = &'a Junction;
    type IntoIter = std::slice::Iter<'a, Junction>;

    fn into_iter(self) -> Self::IntoIter {
        self.junctions.iter()
    }
}

pub fn builtin_junctions() -> Vec<Junction> {
    vec![
        Junction::new("J001", "Downtown Main St", 0.7),
        Junction::new("J002", "University Circle", 0.5),
        Junction::new("J003", "Industrial Park", 0.3),
        Junction::new("J004", "Residential North", 0.4),
        Junction::new("J005", "Shopping District", 0.6),
    ]
}

/// Signal classification of a junction's congestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalState {
    Green,
    Yellow,
    Red,
}

impl SignalState {
    pub fn from_congestion(pct: u8) -> Self {
        if pct > RED_ABOVE_PCT {
            SignalState::Red
        } else if pct > YELLOW_ABOVE_PCT {
            SignalState::Yellow
        } else {
            SignalState::Green
        }
    }

    /// Display color (CSS hex).
    pub fn color(self) -> &'static str {
        match self {
            SignalState::Green => "#10b981",
            SignalState::Yellow => "#f59e0b",
            SignalState::Red => "#ef4444",
        }
    }
}

/// `min(100, floor(vehicles / capacity * 100))`.
pub fn congestion_pct(vehicles: u32) -> u8 {
    let pct = (f64::from(vehicles) / f64::from(JUNCTION_CAPACITY) * 100.0).floor();
    pct.min(100.0) as u8
}

/// One junction's derived metrics for a single refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JunctionReading {
    pub junction_id: String,
    pub name: String,
    pub vehicles: u32,
    pub congestion_pct: u8,
    pub signal: SignalState,
    pub signal_color: &'static str,
    /// `HH:MM`.
    pub last_update: String,
}

/// One complete, immutable set of metrics for all junctions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub total_vehicles: u64,
    pub avg_congestion: u8,
    pub active_junctions: usize,
    pub junctions: Vec<JunctionReading>,
    pub taken_at: NaiveDateTime,
    /// `HH:MM:SS`.
    pub last_update: String,
}
