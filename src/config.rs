use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_RAMP_STEPS: u32 = 10;
pub const DEFAULT_RAMP_INTERVAL_MS: u64 = 1500;
pub const DEFAULT_SESSION_PATH: &str = "data/session.json";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub queue: Option<QueueSection>,
    #[serde(default)]
    pub simulation: Option<SimulationSection>,
    #[serde(default)]
    pub session: Option<SessionSection>,
    #[serde(default)]
    pub metrics: Option<MetricsSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueueSection {
    /// Countdown tick interval in seconds (default: 10)
    pub tick_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationSection {
    /// Number of steps a ramp is divided into (default: 10)
    pub ramp_steps: Option<u32>,
    /// Delay between ramp steps in milliseconds (default: 1500)
    pub ramp_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    /// Returns the countdown tick interval as Duration (default: 10 seconds)
    pub fn tick_interval(&self) -> Duration {
        let secs = self
            .queue
            .as_ref()
            .and_then(|q| q.tick_interval_secs)
            .unwrap_or(DEFAULT_TICK_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    /// Returns the ramp step count (default: 10, floored at 1)
    pub fn ramp_steps(&self) -> u32 {
        self.simulation
            .as_ref()
            .and_then(|s| s.ramp_steps)
            .unwrap_or(DEFAULT_RAMP_STEPS)
            .max(1)
    }

    /// Returns the delay between ramp steps as Duration (default: 1500 ms)
    pub fn ramp_interval(&self) -> Duration {
        let millis = self
            .simulation
            .as_ref()
            .and_then(|s| s.ramp_interval_ms)
            .unwrap_or(DEFAULT_RAMP_INTERVAL_MS);
        Duration::from_millis(millis)
    }

    /// Returns the session record path (default: data/session.json)
    pub fn session_path(&self) -> PathBuf {
        self.session
            .as_ref()
            .and_then(|s| s.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_PATH))
    }

    /// Returns the metrics file path, or None if metrics are disabled.
    pub fn metrics_path(&self) -> Option<&Path> {
        let path = self.metrics.as_ref()?.path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }
}
