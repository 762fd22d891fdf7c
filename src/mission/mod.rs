//! Mission representation and storage.
//!
//! A mission is an ordered list of waypoints; insertion order is navigation
//! order. The store is the single source of truth for the ETA estimator and
//! the snapshot builder, and is only ever replaced wholesale: a new mission
//! swaps in atomically, never item by item.

pub mod file;
pub mod source;

pub use file::parse_mission_file;
pub use source::{LocalMissionSource, MissionSource};

/// A single mission waypoint.
///
/// Index 0 is the home position by waypoint-file convention and is never
/// stored; stored waypoints carry the 1-based index from the mission file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    /// 1-based index from the mission file.
    pub index: u16,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters.
    pub altitude: f64,
    /// Navigation command ID (MAV_CMD_NAV_WAYPOINT etc.).
    pub command: u16,
    /// Continue to the next waypoint without operator input.
    pub autocontinue: bool,
}

impl Waypoint {
    /// Create a plain navigation waypoint (command 16, autocontinue).
    pub fn new(index: u16, latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            index,
            latitude,
            longitude,
            altitude,
            command: 16, // MAV_CMD_NAV_WAYPOINT
            autocontinue: true,
        }
    }
}

/// In-memory mission storage.
///
/// Created empty, replaced wholesale on each mission change. Callers that
/// share a store across tasks wrap it in a lock; a replacement is then a
/// single write so concurrent readers see either the old mission or the new
/// one, never a partial list.
#[derive(Debug, Clone, Default)]
pub struct MissionStore {
    waypoints: Vec<Waypoint>,
}

impl MissionStore {
    /// Create a new empty mission store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire mission.
    ///
    /// Entries carrying the home index (0) are dropped before storage,
    /// mirroring the waypoint-file convention where the first record is the
    /// home position and is never flown.
    pub fn replace(&mut self, waypoints: Vec<Waypoint>) {
        self.waypoints = waypoints.into_iter().filter(|wp| wp.index != 0).collect();
    }

    /// Get a waypoint by list position (0-based).
    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Number of waypoints, excluding home.
    pub fn count(&self) -> usize {
        self.waypoints.len()
    }

    /// Check if no mission is loaded.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// All waypoints in navigation order.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
}
