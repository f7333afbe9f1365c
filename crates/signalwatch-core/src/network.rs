//! Static road network between junctions.
//!
//! Roads are display data only: the generator never reads them. A network is
//! validated against the junction set it describes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalWatchError};
use crate::model::JunctionSet;

/// Functional class of a road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadKind {
    Arterial,
    Collector,
    Local,
}

/// A directed edge between two junctions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Road {
    pub id: String,
    pub source: String,
    pub target: String,
    pub length_km: f64,
    pub lanes: u8,
    #[serde(rename = "type")]
    pub kind: RoadKind,
}

impl Road {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        length_km: f64,
        lanes: u8,
        kind: RoadKind,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            length_km,
            lanes,
            kind,
        }
    }
}

/// Validated road list. May be empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoadNetwork {
    roads: Vec<Road>,
}

impl RoadNetwork {
    /// Check every road against `junctions`.
    ///
    /// Rejects blank or duplicate ids, endpoints that name no junction,
    /// self-loops, zero lanes, and lengths that are not positive.
    pub fn new(roads: Vec<Road>, junctions: &JunctionSet) -> Result<Self> {
        let known: HashSet<&str> = junctions.iter().map(|j| j.id.as_str()).collect();
        let mut seen = HashSet::with_capacity(roads.len());

        for r in &roads {
            if r.id.trim().is_empty() {
                return Err(SignalWatchError::Config("road id must not be blank".into()));
            }
            if !seen.insert(r.id.as_str()) {
                return Err(SignalWatchError::Config(format!("duplicate road id: {}", r.id)));
            }
            for end in [&r.source, &r.target] {
                if !known.contains(end.as_str()) {
                    return Err(SignalWatchError::Config(format!(
                        "road {} references unknown junction {}",
                        r.id, end
                    )));
                }
            }
            if r.source == r.target {
                return Err(SignalWatchError::Config(format!(
                    "road {} must connect two different junctions",
                    r.id
                )));
            }
            if r.lanes == 0 {
                return Err(SignalWatchError::Config(format!("road {} needs at least one lane", r.id)));
            }
            if !r.length_km.is_finite() || r.length_km <= 0.0 {
                return Err(SignalWatchError::Config(format!(
                    "road {} length_km must be positive, got {}",
                    r.id, r.length_km
                )));
            }
        }

        Ok(Self { roads })
    }

    pub fn as_slice(&self) -> &[Road] {
        &self.roads
    }

    pub fn len(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }
}

/// Roads between the five built-in junctions.
pub fn builtin_roads() -> Vec<Road> {
    vec![
        Road::new("R001", "J001", "J002", 0.5, 2, RoadKind::Arterial),
        Road::new("R002", "J002", "J003", 0.8, 3, RoadKind::Arterial),
        Road::new("R003", "J003", "J004", 0.3, 2, RoadKind::Collector),
        Road::new("R004", "J004", "J005", 1.2, 4, RoadKind::Arterial),
        Road::new("R005", "J001", "J005", 1.5, 2, RoadKind::Local),
    ]
}
