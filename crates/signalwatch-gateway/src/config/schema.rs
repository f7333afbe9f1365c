use serde::Deserialize;
use signalwatch_core::error::{Result, SignalWatchError};
use signalwatch_core::model::{builtin_junctions, Junction, JunctionSet};
use signalwatch_core::network::{builtin_roads, Road, RoadNetwork};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub refresh: RefreshSection,

    /// Absent means the built-in demo junctions; present-but-empty is an error.
    #[serde(default)]
    pub junctions: Option<Vec<Junction>>,

    /// Absent means the built-in roads when `junctions` is also absent, and
    /// no roads otherwise.
    #[serde(default)]
    pub roads: Option<Vec<Road>>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            refresh: RefreshSection::default(),
            junctions: None,
            roads: None,
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(SignalWatchError::UnsupportedVersion);
        }

        self.gateway.validate()?;   // Verify the scope of value
        self.refresh.validate()?;
        let junctions = self.junction_set()?;
        self.road_network(&junctions)?;

        Ok(())
    }

    /// Build the validated junction set this config describes.
    pub fn junction_set(&self) -> Result<JunctionSet> {
        match &self.junctions {
            Some(list) => JunctionSet::new(list.clone()),
            None => JunctionSet::new(builtin_junctions()),
        }
    }

    /// Build the road network, checked against `junctions`.
    pub fn road_network(&self, junctions: &JunctionSet) -> Result<RoadNetwork> {
        match (&self.roads, &self.junctions) {
            (Some(list), _) => RoadNetwork::new(list.clone(), junctions),
            (None, None) => RoadNetwork::new(builtin_roads(), junctions),
            (None, Some(_)) => Ok(RoadNetwork::default()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(SignalWatchError::BadRequest(
                "gateway.listen must be a valid SocketAddr".into(),
            ));
        }
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(SignalWatchError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(SignalWatchError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(SignalWatchError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(256..=65536).contains(&self.max_frame_bytes) {
            return Err(SignalWatchError::BadRequest(
                "gateway.max_frame_bytes must be between 256 and 65536".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_max_frame_bytes() -> usize {
    4096
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshSection {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Initial state of automatic refresh.
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,

    /// Fixed RNG seed; `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            auto_start: default_auto_start(),
            seed: None,
        }
    }
}

impl RefreshSection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=3_600_000).contains(&self.interval_ms) {
            return Err(SignalWatchError::BadRequest(
                "refresh.interval_ms must be between 1000 and 3600000".into(),
            ));
        }
        Ok(())
    }
}

fn default_interval_ms() -> u64 {
    10_000
}
fn default_auto_start() -> bool {
    true
}
