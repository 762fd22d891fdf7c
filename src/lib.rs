//! trail-relay - Companion-computer telemetry relay for MAVLink-style rovers
//!
//! Tracks a vehicle's live navigation state from its attribute event stream,
//! estimates arrival times for every waypoint of the active mission, and
//! publishes an aggregated JSON telemetry snapshot at a fixed rate. Missions
//! are loaded by name from external storage and re-uploaded to the vehicle.

pub mod config;
pub mod error;
pub mod geo;
pub mod link;
pub mod mission;
pub mod nav;
pub mod service;
pub mod telemetry;

pub use config::RelayConfig;
pub use error::RelayError;
pub use link::{ConsoleCommand, SimConfig, SimLink, StdoutSink, TelemetrySink, VehicleLink};
pub use mission::{LocalMissionSource, MissionSource, MissionStore, Waypoint};
pub use nav::eta::EtaEntry;
pub use nav::{FixQuality, LinkEvent, NavigationState};
pub use service::TelemetryRelay;
pub use telemetry::TelemetrySnapshot;
