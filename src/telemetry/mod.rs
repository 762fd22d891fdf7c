//! Telemetry snapshot assembly.
//!
//! Builds the wire structure handed to the telemetry sink on every tick.
//! Field names and nesting are a compatibility contract with the downstream
//! console; renaming anything here breaks deployed consumers.
//!
//! Display floats are rounded to 2 decimals when the snapshot is built;
//! the navigation state itself keeps full precision for distance math.

use serde::Serialize;

use crate::nav::eta::EtaEntry;
use crate::nav::NavigationState;

/// Position block: latitude, longitude, relative altitude.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

/// Attitude block, degrees.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Attitude {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// Distance block, meters.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Distances {
    pub travelled: f64,
    #[serde(rename = "toHome")]
    pub to_home: f64,
    #[serde(rename = "toNextWp")]
    pub to_next_wp: f64,
}

/// Speed block, m/s.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Speeds {
    pub air: f64,
    pub ground: f64,
}

/// Navigation block: next waypoint pointer and arrival estimates.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Navigation {
    #[serde(rename = "nextWp")]
    pub next_wp: u16,
    pub eta: Vec<String>,
}

/// Battery block.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Battery {
    pub volt: f64,
    pub current: f64,
}

/// Inner telemetry object.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Telemetry {
    pub pos: Position,
    pub att: Attitude,
    pub dist: Distances,
    pub speed: Speeds,
    pub nav: Navigation,
    pub mode: String,
    pub gps: String,
    pub batt: Battery,
}

/// Complete snapshot published to the telemetry sink.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TelemetrySnapshot {
    pub telemetry: Telemetry,
    pub id: u32,
}

/// Round to 2 decimals for display.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl TelemetrySnapshot {
    /// Assemble a snapshot from the current state and arrival estimates.
    ///
    /// Pure read; mutates nothing.
    pub fn build(state: &NavigationState, eta: &[EtaEntry], vehicle_id: u32) -> Self {
        Self {
            telemetry: Telemetry {
                pos: Position {
                    lat: state.latitude,
                    lon: state.longitude,
                    alt: round2(state.altitude_rel),
                },
                att: Attitude {
                    roll: round2(state.roll),
                    pitch: round2(state.pitch),
                    yaw: round2(state.yaw),
                },
                dist: Distances {
                    travelled: round2(state.distance_travelled),
                    to_home: round2(state.distance_to_home),
                    to_next_wp: round2(state.distance_to_next_wp),
                },
                speed: Speeds {
                    air: round2(state.air_speed),
                    ground: round2(state.ground_speed),
                },
                nav: Navigation {
                    next_wp: state.next_wp,
                    eta: eta.iter().map(EtaEntry::label).collect(),
                },
                mode: state.mode.clone(),
                gps: state.fix_quality.label().to_string(),
                batt: Battery {
                    volt: round2(state.battery_voltage),
                    current: round2(state.battery_current),
                },
            },
            id: vehicle_id,
        }
    }
}
