//! Best-effort load telemetry.
//!
//! Snapshots are advisory: a sink that fails to record loses the data point
//! and nothing else. Every failure path here ends in a `warn!`, not an error.

use crate::traffic::TrafficStatus;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadEvent {
    Join,
    Leave,
    Turn,
    Spike,
    Drop,
    RampStep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSnapshot {
    pub timestamp: String,
    pub user_count: u32,
    pub traffic_status: TrafficStatus,
    pub event: LoadEvent,
}

impl LoadSnapshot {
    pub fn capture(user_count: u32, traffic_status: TrafficStatus, event: LoadEvent) -> Self {
        let timestamp = OffsetDateTime::from(SystemTime::now())
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string());
        Self {
            timestamp,
            user_count,
            traffic_status,
            event,
        }
    }
}

pub trait MetricsSink: Send + Sync {
    fn record(&self, snapshot: &LoadSnapshot);
}

/// Appends one JSON object per snapshot to a local file.
#[derive(Debug)]
pub struct JsonlMetricsSink {
    path: PathBuf,
}

impl JsonlMetricsSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, snapshot: &LoadSnapshot) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(snapshot)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl MetricsSink for JsonlMetricsSink {
    fn record(&self, snapshot: &LoadSnapshot) {
        if let Err(err) = self.append(snapshot) {
            warn!(path = %self.path.display(), error = %err, "Failed to record load snapshot");
        }
    }
}

/// Discards every snapshot. Used when no metrics path is configured.
#[derive(Debug, Default)]
pub struct NullMetricsSink;

impl MetricsSink for NullMetricsSink {
    fn record(&self, _snapshot: &LoadSnapshot) {}
}

/// Test sink that keeps snapshots in memory.
#[derive(Debug, Default)]
pub struct RecordingMetricsSink {
    snapshots: Mutex<Vec<LoadSnapshot>>,
}

impl RecordingMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<LoadSnapshot> {
        self.snapshots
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<LoadEvent> {
        self.snapshots().into_iter().map(|s| s.event).collect()
    }
}

impl MetricsSink for RecordingMetricsSink {
    fn record(&self, snapshot: &LoadSnapshot) {
        if let Ok(mut guard) = self.snapshots.lock() {
            guard.push(snapshot.clone());
        }
    }
}
