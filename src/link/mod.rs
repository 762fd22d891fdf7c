//! Vehicle link and telemetry sink boundaries.
//!
//! The relay never talks a wire protocol itself: the autopilot connection,
//! the pub/sub command transport, and the downstream console are external
//! collaborators behind these traits. Everything crossing the boundary is a
//! plain type: [`LinkEvent`](crate::nav::LinkEvent) in, waypoints and mode
//! strings out, [`TelemetrySnapshot`](crate::telemetry::TelemetrySnapshot)
//! to the sink.

pub mod sim;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::mission::Waypoint;
use crate::telemetry::TelemetrySnapshot;

pub use sim::{SimConfig, SimLink};

/// Connection to the vehicle autopilot.
///
/// Asynchronous attribute changes arrive separately as a stream of
/// [`LinkEvent`](crate::nav::LinkEvent)s; this trait covers the calls the
/// relay itself initiates, namely the per-tick reads and the mission/mode
/// requests. Implementations must be `Send + Sync` for use as
/// `Arc<dyn VehicleLink>` across tasks.
#[async_trait]
pub trait VehicleLink: Send + Sync {
    /// 1-based index of the waypoint the vehicle navigates toward;
    /// 0 when no waypoint is active.
    async fn next_waypoint_index(&self) -> u16;

    /// Home position, once the autopilot has one.
    async fn home_position(&self) -> Option<(f64, f64)>;

    /// Request a flight-mode change.
    async fn set_mode(&self, mode: &str) -> Result<(), RelayError>;

    /// Replace the mission on the vehicle: clear, then add all waypoints.
    async fn upload_mission(&self, waypoints: &[Waypoint]) -> Result<(), RelayError>;

    /// Download the mission currently stored on the vehicle.
    async fn download_mission(&self) -> Result<Vec<Waypoint>, RelayError>;
}

/// Downstream consumer of telemetry snapshots.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Deliver one snapshot. Errors are logged by the tick loop and never
    /// stop publication.
    async fn publish(&self, snapshot: &TelemetrySnapshot) -> Result<(), RelayError>;
}

/// Operator request from the command channel.
///
/// Both fields are independent; an empty string means "no request". This
/// mirrors the console payload where one message may carry a mission load,
/// a mode change, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleCommand {
    /// Mission name to load from the mission source.
    #[serde(default)]
    pub mission: String,
    /// Flight mode to request from the vehicle.
    #[serde(default)]
    pub mode: String,
}

/// Sink printing one JSON line per snapshot to stdout.
pub struct StdoutSink;

#[async_trait]
impl TelemetrySink for StdoutSink {
    async fn publish(&self, snapshot: &TelemetrySnapshot) -> Result<(), RelayError> {
        let line = serde_json::to_string(snapshot)
            .map_err(|e| RelayError::Publish(e.to_string()))?;
        println!("{line}");
        Ok(())
    }
}
