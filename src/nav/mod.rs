//! Navigation state tracking.
//!
//! Maintains the live snapshot of vehicle navigation state (position,
//! attitude, speeds, fix quality, mode, cumulative distance) fed by the
//! vehicle link's event stream.
//!
//! # Event dispatch
//!
//! Each link event updates exactly one field group, and any derived field
//! (distance travelled, distance to next waypoint) is recomputed inside the
//! same [`NavigationState::apply`] call. Callers hold the state write lock
//! across `apply`, so a derived distance never mixes a half-updated
//! previous/current position pair.

pub mod eta;

use tracing::warn;

use crate::geo;
use crate::mission::MissionStore;

/// GPS fix quality reported by the autopilot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixQuality {
    /// No usable fix (raw fix type below 3).
    #[default]
    None,
    /// Standard 3D fix.
    Fix3D,
    /// Differential GPS fix.
    Dgps,
    /// RTK float solution.
    RtkFloat,
    /// RTK fixed solution.
    RtkFixed,
}

impl FixQuality {
    /// Map a raw MAVLink fix-type value to a quality level.
    ///
    /// Returns `None` for values above the known range (> 6); the caller
    /// keeps its previous quality in that case.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0..=2 => Some(FixQuality::None),
            3 => Some(FixQuality::Fix3D),
            4 => Some(FixQuality::Dgps),
            5 => Some(FixQuality::RtkFloat),
            6 => Some(FixQuality::RtkFixed),
            _ => None,
        }
    }

    /// Display label used in the telemetry snapshot.
    pub fn label(&self) -> &'static str {
        match self {
            FixQuality::None => "",
            FixQuality::Fix3D => "3D",
            FixQuality::Dgps => "DGPS",
            FixQuality::RtkFloat => "RTKFLT",
            FixQuality::RtkFixed => "RTKFXD",
        }
    }
}

/// Asynchronous state change delivered by the vehicle link.
///
/// One variant per attribute group; angles arrive in radians as the
/// autopilot reports them and are converted at the state boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Global position update.
    Position {
        latitude: f64,
        longitude: f64,
        /// Altitude above the home position, meters.
        altitude_rel: f64,
    },
    /// Attitude update, radians.
    Attitude {
        roll_rad: f64,
        pitch_rad: f64,
        yaw_rad: f64,
    },
    /// Raw GPS fix-type value.
    GpsFix(u8),
    /// Ground speed, m/s.
    GroundSpeed(f64),
    /// Airspeed, m/s.
    AirSpeed(f64),
    /// Flight mode name, stored verbatim.
    Mode(String),
    /// Battery voltage (V) and current (A).
    Battery { voltage: f64, current: f64 },
    /// WPNAV_SPEED autopilot parameter, cm/s.
    NavSpeedParam(f64),
}

/// Modes in which the vehicle navigates on its own and odometry is
/// meaningful.
const AUTONOMOUS_MODES: [&str; 2] = ["AUTO", "GUIDED"];

/// Live navigation state snapshot.
///
/// Mutated incrementally by [`apply`](Self::apply); never reset after
/// process start.
#[derive(Debug, Clone)]
pub struct NavigationState {
    /// Current latitude, degrees.
    pub latitude: f64,
    /// Current longitude, degrees.
    pub longitude: f64,
    /// Altitude above home, meters.
    pub altitude_rel: f64,
    /// Roll, degrees.
    pub roll: f64,
    /// Pitch, degrees.
    pub pitch: f64,
    /// Yaw, degrees.
    pub yaw: f64,
    /// Ground speed, m/s, full precision.
    pub ground_speed: f64,
    /// Airspeed, m/s, full precision.
    pub air_speed: f64,
    /// GPS fix quality.
    pub fix_quality: FixQuality,
    /// Flight mode as reported by the vehicle, no normalization.
    pub mode: String,
    /// 1-based index of the waypoint currently navigated toward; 0 = none.
    pub next_wp: u16,
    /// Cumulative distance travelled in autonomous modes, meters.
    pub distance_travelled: f64,
    /// Distance from home to the current position, meters.
    pub distance_to_home: f64,
    /// Distance from the current position to the next waypoint, meters.
    pub distance_to_next_wp: f64,
    /// Battery voltage, volts.
    pub battery_voltage: f64,
    /// Battery current, amperes.
    pub battery_current: f64,
    /// Home latitude, degrees; 0 until the first valid home report.
    pub home_latitude: f64,
    /// Home longitude, degrees; 0 until the first valid home report.
    pub home_longitude: f64,
    /// Previous position for odometry, degrees.
    pub prev_latitude: f64,
    /// Previous position for odometry, degrees.
    pub prev_longitude: f64,
    /// Waypoint-navigation fallback speed, m/s (from WPNAV_SPEED).
    pub fallback_speed_mps: f64,
}

impl NavigationState {
    /// Create a fresh state with the given fallback navigation speed.
    pub fn new(fallback_speed_mps: f64) -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            altitude_rel: 0.0,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            ground_speed: 0.0,
            air_speed: 0.0,
            fix_quality: FixQuality::None,
            mode: "HOLD".to_string(),
            next_wp: 0,
            distance_travelled: 0.0,
            distance_to_home: 0.0,
            distance_to_next_wp: 0.0,
            battery_voltage: 0.0,
            battery_current: 0.0,
            home_latitude: 0.0,
            home_longitude: 0.0,
            prev_latitude: 0.0,
            prev_longitude: 0.0,
            fallback_speed_mps,
        }
    }

    /// True when the vehicle is navigating on its own (AUTO or GUIDED).
    pub fn is_autonomous(&self) -> bool {
        AUTONOMOUS_MODES.iter().any(|m| self.mode == *m)
    }

    /// Apply a link event to the state.
    ///
    /// The mission store is consulted for the distance-to-next-waypoint
    /// recomputation on position updates; pass the store visible to the
    /// tick path so both paths agree on the active mission.
    pub fn apply(&mut self, event: LinkEvent, mission: &MissionStore) {
        match event {
            LinkEvent::Position {
                latitude,
                longitude,
                altitude_rel,
            } => self.apply_position(latitude, longitude, altitude_rel, mission),
            LinkEvent::Attitude {
                roll_rad,
                pitch_rad,
                yaw_rad,
            } => {
                self.roll = roll_rad.to_degrees();
                self.pitch = pitch_rad.to_degrees();
                self.yaw = yaw_rad.to_degrees();
            }
            LinkEvent::GpsFix(raw) => match FixQuality::from_raw(raw) {
                Some(quality) => self.fix_quality = quality,
                None => warn!(fix_type = raw, "unrecognized GPS fix type, keeping previous"),
            },
            LinkEvent::GroundSpeed(speed) => self.ground_speed = speed,
            LinkEvent::AirSpeed(speed) => self.air_speed = speed,
            LinkEvent::Mode(mode) => self.mode = mode,
            LinkEvent::Battery { voltage, current } => {
                self.battery_voltage = voltage;
                self.battery_current = current;
            }
            LinkEvent::NavSpeedParam(raw_cms) => {
                // WPNAV_SPEED arrives in cm/s
                self.fallback_speed_mps = raw_cms / 100.0;
            }
        }
    }

    /// Position field group: update coordinates and derived distances as one
    /// unit.
    ///
    /// Distance travelled accumulates only in autonomous modes and only once
    /// two consecutive valid fixes exist. The previous position updates on
    /// every event regardless of mode, so odometry drift does not compound
    /// across mode changes.
    fn apply_position(&mut self, latitude: f64, longitude: f64, altitude_rel: f64, mission: &MissionStore) {
        self.latitude = latitude;
        self.longitude = longitude;
        self.altitude_rel = altitude_rel;

        let have_fix = latitude != 0.0 && longitude != 0.0;
        let have_prev = self.prev_latitude != 0.0 && self.prev_longitude != 0.0;

        if have_fix && have_prev && self.is_autonomous() {
            self.distance_travelled += geo::distance_m(
                self.prev_latitude,
                self.prev_longitude,
                latitude,
                longitude,
            );

            if !mission.is_empty() && self.next_wp > 0 {
                if let Some(wp) = mission.get(self.next_wp as usize - 1) {
                    self.distance_to_next_wp =
                        geo::distance_m(latitude, longitude, wp.latitude, wp.longitude);
                }
            }
        }

        self.prev_latitude = latitude;
        self.prev_longitude = longitude;
    }

    /// Record the next-waypoint pointer read from the vehicle on each tick.
    pub fn set_next_wp(&mut self, next_wp: u16) {
        self.next_wp = next_wp;
    }

    /// Latch the home position the first time both coordinates are valid.
    pub fn update_home(&mut self, home: Option<(f64, f64)>) {
        if self.home_latitude != 0.0 || self.home_longitude != 0.0 {
            return;
        }
        if let Some((lat, lon)) = home {
            if lat != 0.0 && lon != 0.0 {
                self.home_latitude = lat;
                self.home_longitude = lon;
            }
        }
    }

    /// Recompute the distance from home to the current position.
    ///
    /// Called on every tick once home is known.
    pub fn refresh_distance_to_home(&mut self) {
        if self.home_latitude != 0.0 && self.home_longitude != 0.0 {
            self.distance_to_home = geo::distance_m(
                self.home_latitude,
                self.home_longitude,
                self.latitude,
                self.longitude,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::Waypoint;

    fn auto_state() -> NavigationState {
        let mut state = NavigationState::new(10.0);
        state.apply(LinkEvent::Mode("AUTO".to_string()), &MissionStore::new());
        state
    }

    fn position(lat: f64, lon: f64) -> LinkEvent {
        LinkEvent::Position {
            latitude: lat,
            longitude: lon,
            altitude_rel: 10.0,
        }
    }

    // ========== Fix quality mapping ==========

    #[test]
    fn test_fix_quality_from_raw() {
        assert_eq!(FixQuality::from_raw(0), Some(FixQuality::None));
        assert_eq!(FixQuality::from_raw(2), Some(FixQuality::None));
        assert_eq!(FixQuality::from_raw(3), Some(FixQuality::Fix3D));
        assert_eq!(FixQuality::from_raw(4), Some(FixQuality::Dgps));
        assert_eq!(FixQuality::from_raw(5), Some(FixQuality::RtkFloat));
        assert_eq!(FixQuality::from_raw(6), Some(FixQuality::RtkFixed));
        assert_eq!(FixQuality::from_raw(7), None);
        assert_eq!(FixQuality::from_raw(255), None);
    }

    #[test]
    fn test_fix_quality_labels() {
        assert_eq!(FixQuality::None.label(), "");
        assert_eq!(FixQuality::Fix3D.label(), "3D");
        assert_eq!(FixQuality::Dgps.label(), "DGPS");
        assert_eq!(FixQuality::RtkFloat.label(), "RTKFLT");
        assert_eq!(FixQuality::RtkFixed.label(), "RTKFXD");
    }

    #[test]
    fn test_unrecognized_fix_keeps_previous() {
        let mut state = auto_state();
        let mission = MissionStore::new();

        state.apply(LinkEvent::GpsFix(6), &mission);
        assert_eq!(state.fix_quality, FixQuality::RtkFixed);

        state.apply(LinkEvent::GpsFix(9), &mission);
        assert_eq!(state.fix_quality, FixQuality::RtkFixed);
    }

    // ========== Odometry ==========

    #[test]
    fn test_no_accumulation_on_first_position() {
        let mut state = auto_state();
        let mission = MissionStore::new();

        state.apply(position(35.0, 139.0), &mission);
        assert_eq!(state.distance_travelled, 0.0);
        assert_eq!(state.prev_latitude, 35.0);
    }

    #[test]
    fn test_accumulation_in_auto_mode() {
        let mut state = auto_state();
        let mission = MissionStore::new();

        state.apply(position(35.0, 139.0), &mission);
        state.apply(position(35.0, 139.001), &mission);

        // ~90m per 0.001 degrees of longitude at 35N
        assert!(state.distance_travelled > 80.0 && state.distance_travelled < 100.0);
    }

    #[test]
    fn test_accumulation_in_guided_mode() {
        let mut state = NavigationState::new(10.0);
        let mission = MissionStore::new();
        state.apply(LinkEvent::Mode("GUIDED".to_string()), &mission);

        state.apply(position(10.0, 0.001), &mission);
        state.apply(position(10.0, 0.002), &mission);
        assert!(state.distance_travelled > 100.0);
    }

    #[test]
    fn test_no_accumulation_in_manual_mode() {
        let mut state = NavigationState::new(10.0);
        let mission = MissionStore::new();
        state.apply(LinkEvent::Mode("MANUAL".to_string()), &mission);

        state.apply(position(35.0, 139.0), &mission);
        state.apply(position(35.0, 139.001), &mission);

        assert_eq!(state.distance_travelled, 0.0);
        // Previous position still tracks, so entering AUTO later does not
        // credit the manual leg
        assert_eq!(state.prev_longitude, 139.001);
    }

    #[test]
    fn test_mode_switch_does_not_credit_manual_leg() {
        let mut state = NavigationState::new(10.0);
        let mission = MissionStore::new();

        state.apply(LinkEvent::Mode("MANUAL".to_string()), &mission);
        state.apply(position(35.0, 139.0), &mission);
        state.apply(position(35.0, 139.01), &mission); // ~910m in manual

        state.apply(LinkEvent::Mode("AUTO".to_string()), &mission);
        state.apply(position(35.0, 139.011), &mission); // ~91m in auto

        assert!(
            state.distance_travelled < 100.0,
            "only the AUTO leg counts, got {}",
            state.distance_travelled
        );
    }

    #[test]
    fn test_no_accumulation_from_zero_island() {
        let mut state = auto_state();
        let mission = MissionStore::new();

        // First fix after boot jumps from (0,0); must not count
        state.apply(position(0.0, 0.0), &mission);
        state.apply(position(35.0, 139.0), &mission);
        assert_eq!(state.distance_travelled, 0.0);
    }

    #[test]
    fn test_distance_to_next_wp_recomputed() {
        let mut state = auto_state();
        let mut mission = MissionStore::new();
        mission.replace(vec![
            Waypoint::new(1, 35.0, 139.01, 50.0),
            Waypoint::new(2, 35.0, 139.02, 50.0),
        ]);
        state.set_next_wp(1);

        state.apply(position(35.0, 139.0), &mission);
        state.apply(position(35.0, 139.001), &mission);

        // ~0.009 degrees of longitude to waypoint 1
        assert!(
            state.distance_to_next_wp > 700.0 && state.distance_to_next_wp < 900.0,
            "got {}",
            state.distance_to_next_wp
        );
    }

    #[test]
    fn test_distance_to_next_wp_untouched_without_mission() {
        let mut state = auto_state();
        let mission = MissionStore::new();
        state.set_next_wp(1);

        state.apply(position(35.0, 139.0), &mission);
        state.apply(position(35.0, 139.001), &mission);
        assert_eq!(state.distance_to_next_wp, 0.0);
    }

    // ========== Attitude and speeds ==========

    #[test]
    fn test_attitude_converted_to_degrees() {
        let mut state = NavigationState::new(10.0);
        let mission = MissionStore::new();

        state.apply(
            LinkEvent::Attitude {
                roll_rad: std::f64::consts::FRAC_PI_2,
                pitch_rad: -std::f64::consts::FRAC_PI_4,
                yaw_rad: std::f64::consts::PI,
            },
            &mission,
        );

        assert!((state.roll - 90.0).abs() < 1e-9);
        assert!((state.pitch + 45.0).abs() < 1e-9);
        assert!((state.yaw - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_speeds_stored_full_precision() {
        let mut state = NavigationState::new(10.0);
        let mission = MissionStore::new();

        state.apply(LinkEvent::GroundSpeed(3.14159), &mission);
        state.apply(LinkEvent::AirSpeed(2.71828), &mission);

        assert_eq!(state.ground_speed, 3.14159);
        assert_eq!(state.air_speed, 2.71828);
    }

    #[test]
    fn test_mode_stored_verbatim() {
        let mut state = NavigationState::new(10.0);
        let mission = MissionStore::new();

        state.apply(LinkEvent::Mode("RTL".to_string()), &mission);
        assert_eq!(state.mode, "RTL");
        assert!(!state.is_autonomous());

        state.apply(LinkEvent::Mode("SMART_RTL".to_string()), &mission);
        assert_eq!(state.mode, "SMART_RTL");
    }

    #[test]
    fn test_nav_speed_param_converted() {
        let mut state = NavigationState::new(10.0);
        let mission = MissionStore::new();

        state.apply(LinkEvent::NavSpeedParam(200.0), &mission);
        assert!((state.fallback_speed_mps - 2.0).abs() < f64::EPSILON);
    }

    // ========== Home position ==========

    #[test]
    fn test_home_latched_once() {
        let mut state = NavigationState::new(10.0);

        state.update_home(None);
        assert_eq!(state.home_latitude, 0.0);

        state.update_home(Some((0.0, 0.0)));
        assert_eq!(state.home_latitude, 0.0);

        state.update_home(Some((35.0, 139.0)));
        assert_eq!(state.home_latitude, 35.0);

        // Later reports do not move home
        state.update_home(Some((36.0, 140.0)));
        assert_eq!(state.home_latitude, 35.0);
        assert_eq!(state.home_longitude, 139.0);
    }

    #[test]
    fn test_distance_to_home() {
        let mut state = auto_state();
        let mission = MissionStore::new();

        state.update_home(Some((35.0, 139.0)));
        state.apply(position(35.0, 139.001), &mission);
        state.refresh_distance_to_home();

        assert!(state.distance_to_home > 80.0 && state.distance_to_home < 100.0);
    }

    #[test]
    fn test_distance_to_home_skipped_without_home() {
        let mut state = auto_state();
        let mission = MissionStore::new();

        state.apply(position(35.0, 139.001), &mission);
        state.refresh_distance_to_home();
        assert_eq!(state.distance_to_home, 0.0);
    }

    #[test]
    fn test_battery_update() {
        let mut state = NavigationState::new(10.0);
        let mission = MissionStore::new();

        state.apply(
            LinkEvent::Battery {
                voltage: 12.6,
                current: 4.2,
            },
            &mission,
        );
        assert_eq!(state.battery_voltage, 12.6);
        assert_eq!(state.battery_current, 4.2);
    }
}
