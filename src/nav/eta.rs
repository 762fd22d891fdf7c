//! Waypoint arrival estimation.
//!
//! Projects an arrival time for every waypoint of the active mission from
//! the vehicle's current position and speed. Estimates chain sequentially:
//! a delay on the current leg pushes every later arrival back by the same
//! amount, because each future leg is timed from the previous leg's
//! computed arrival rather than from the present.

use chrono::{DateTime, Duration, Local};

use crate::geo;
use crate::mission::MissionStore;

/// Arrival estimate for a single waypoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EtaEntry {
    /// Waypoint is behind the current navigation target.
    Passed,
    /// Projected wall-clock arrival time.
    EstimateAt(DateTime<Local>),
}

impl EtaEntry {
    /// Display label used in the telemetry snapshot.
    pub fn label(&self) -> String {
        match self {
            EtaEntry::Passed => "Passed".to_string(),
            EtaEntry::EstimateAt(at) => at.format("%H:%M:%S").to_string(),
        }
    }
}

/// Compute per-waypoint arrival estimates.
///
/// `next_wp` is the 1-based index of the waypoint currently navigated
/// toward and must be at least 1; with no active target (0) there is
/// nothing to estimate and the caller publishes an empty list instead.
///
/// Leg velocities: the current leg uses `ground_speed` unless it is zero,
/// in which case `fallback_speed` substitutes; future legs always use
/// `fallback_speed`, since the present ground speed is not assumed to
/// persist into unflown legs. `fallback_speed` must be positive, which
/// keeps every division away from zero.
///
/// A vehicle crawling below `stall_speed` while targeting the final
/// waypoint is considered arrived: the whole list collapses to `Passed`
/// rather than projecting a runaway estimate from a near-zero divisor.
pub fn estimate(
    next_wp: u16,
    cur_lat: f64,
    cur_lon: f64,
    mission: &MissionStore,
    ground_speed: f64,
    fallback_speed: f64,
    stall_speed: f64,
    now: DateTime<Local>,
) -> Vec<EtaEntry> {
    let count = mission.count();
    let target = next_wp as usize; // 1-based
    let mut entries = Vec::with_capacity(count);
    let mut last_arrival = now;

    for i in 0..count {
        if i + 1 < target {
            // Already behind the current target
            entries.push(EtaEntry::Passed);
        } else if i + 1 == target {
            // Current leg: vehicle position to the target waypoint
            let wp = match mission.get(i) {
                Some(wp) => wp,
                None => break,
            };
            let dist = geo::distance_m(cur_lat, cur_lon, wp.latitude, wp.longitude);
            let velocity = if ground_speed == 0.0 {
                fallback_speed
            } else {
                ground_speed
            };
            last_arrival = advance(now, dist / velocity);
            entries.push(EtaEntry::EstimateAt(last_arrival));
        } else {
            // Future leg: previous waypoint to this one, chained from the
            // previous arrival
            let (prev, wp) = match (mission.get(i - 1), mission.get(i)) {
                (Some(prev), Some(wp)) => (prev, wp),
                _ => break,
            };
            let dist = geo::distance_m(prev.latitude, prev.longitude, wp.latitude, wp.longitude);
            last_arrival = advance(last_arrival, dist / fallback_speed);
            entries.push(EtaEntry::EstimateAt(last_arrival));
        }
    }

    // A stalled vehicle at the final waypoint has arrived
    if ground_speed < stall_speed && target == count {
        return vec![EtaEntry::Passed; count];
    }

    entries
}

/// Offset a timestamp by a duration given in seconds.
///
/// Non-finite or out-of-range offsets leave the base unchanged instead of
/// overflowing the time type.
fn advance(base: DateTime<Local>, seconds: f64) -> DateTime<Local> {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() {
        return base;
    }
    base + Duration::try_milliseconds(millis as i64).unwrap_or_else(Duration::zero)
}
