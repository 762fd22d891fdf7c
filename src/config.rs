//! Relay node configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the telemetry relay node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Vehicle identifier attached to every published snapshot.
    pub vehicle_id: u32,
    /// Telemetry publish rate in Hz.
    pub tick_hz: u32,
    /// Waypoint navigation speed as reported by the autopilot parameter
    /// (WPNAV_SPEED, cm/s). Divided by 100 at ingestion to get m/s.
    pub nav_speed_raw: f64,
    /// Ground speed below which the vehicle is considered stalled (m/s).
    pub stall_speed_mps: f64,
    /// Directory searched by the local mission source.
    pub mission_dir: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            vehicle_id: 1,
            tick_hz: 10,
            nav_speed_raw: 1000.0, // 10 m/s
            stall_speed_mps: 0.1,
            mission_dir: ".".to_string(),
        }
    }
}

impl RelayConfig {
    /// Fallback waypoint-navigation speed in m/s.
    ///
    /// The autopilot stores WPNAV_SPEED in cm/s; the conversion lives here
    /// so no other code divides by 100 ad hoc.
    pub fn fallback_speed_mps(&self) -> f64 {
        self.nav_speed_raw / 100.0
    }

    /// Tick interval derived from `tick_hz` (minimum 1 Hz).
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.tick_hz.max(1) as f64)
    }
}
