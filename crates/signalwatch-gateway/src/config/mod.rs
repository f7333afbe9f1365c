//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use signalwatch_core::error::{Result, SignalWatchError};

pub use schema::{GatewayConfig, GatewaySection, RefreshSection};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "SIGNALWATCH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "signalwatch.yaml";

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| SignalWatchError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| SignalWatchError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the config path from the environment, falling back to the default file.
///
/// A missing default file yields the built-in defaults; a missing file named
/// explicitly by the environment is an error.
pub fn load_default() -> Result<GatewayConfig> {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => load_from_file(&path),
        Err(_) if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => {
            load_from_file(DEFAULT_CONFIG_PATH)
        }
        Err(_) => {
            tracing::info!(path = DEFAULT_CONFIG_PATH, "config file not found, using defaults");
            let cfg = GatewayConfig::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }
}
