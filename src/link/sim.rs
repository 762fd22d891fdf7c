//! Built-in simulated vehicle link.
//!
//! Self-contained kinematic simulation with no external dependencies,
//! suitable for CI testing and demo runs of the relay node. The simulated
//! vehicle drives toward its mission waypoints at a fixed cruise speed and
//! feeds the full event set through the same channel a real link adapter
//! would use. Deterministic under a fixed RNG seed.

use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, Mutex};

use crate::error::RelayError;
use crate::geo;
use crate::link::VehicleLink;
use crate::mission::Waypoint;
use crate::nav::LinkEvent;

/// Configuration for the simulated link.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Start (and home) latitude in degrees.
    pub origin_lat_deg: f64,
    /// Start (and home) longitude in degrees.
    pub origin_lon_deg: f64,
    /// Cruise speed while navigating, m/s.
    pub cruise_speed_mps: f64,
    /// Event emission rate in Hz.
    pub event_rate_hz: u32,
    /// Distance at which a waypoint counts as reached, meters.
    pub wp_radius_m: f64,
    /// GPS position noise amplitude, meters.
    pub gps_noise_m: f64,
    /// Initial battery voltage, volts.
    pub battery_voltage: f64,
    /// RNG seed for deterministic runs. None = random.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            origin_lat_deg: 35.6762,
            origin_lon_deg: 139.6503,
            cruise_speed_mps: 2.0,
            event_rate_hz: 10,
            wp_radius_m: 2.0,
            gps_noise_m: 0.0,
            battery_voltage: 12.6,
            seed: None,
        }
    }
}

/// Meters per degree of latitude.
const M_PER_DEG_LAT: f64 = 111_320.0;

/// Internal vehicle state for kinematics integration.
#[derive(Debug)]
struct SimVehicle {
    lat: f64,
    lon: f64,
    yaw_deg: f64,
    speed_mps: f64,
    mode: String,
    mission: Vec<Waypoint>,
    next_wp: u16,
    battery_voltage: f64,
    step_count: u64,
}

impl SimVehicle {
    fn new(config: &SimConfig) -> Self {
        Self {
            lat: config.origin_lat_deg,
            lon: config.origin_lon_deg,
            yaw_deg: 0.0,
            speed_mps: 0.0,
            mode: "HOLD".to_string(),
            mission: Vec::new(),
            next_wp: 0,
            battery_voltage: config.battery_voltage,
            step_count: 0,
        }
    }

    fn is_autonomous(&self) -> bool {
        self.mode == "AUTO" || self.mode == "GUIDED"
    }

    /// Advance one time step and collect the events it produces.
    fn step(&mut self, config: &SimConfig, rng: &mut StdRng) -> Vec<LinkEvent> {
        let dt = 1.0 / config.event_rate_hz.max(1) as f64;
        let mut events = Vec::new();

        if self.step_count == 0 {
            // One-shot boot reports: parameters and fix before motion
            events.push(LinkEvent::Mode(self.mode.clone()));
            events.push(LinkEvent::NavSpeedParam(config.cruise_speed_mps * 100.0));
            events.push(LinkEvent::GpsFix(3));
        }

        if self.is_autonomous() && self.next_wp >= 1 {
            if let Some(target) = self.mission.get(self.next_wp as usize - 1).copied() {
                let dist = geo::distance_m(self.lat, self.lon, target.latitude, target.longitude);
                if dist < config.wp_radius_m {
                    if (self.next_wp as usize) < self.mission.len() {
                        self.next_wp += 1;
                    } else {
                        // Final waypoint reached, hold position
                        self.speed_mps = 0.0;
                    }
                } else {
                    self.yaw_deg =
                        geo::bearing_deg(self.lat, self.lon, target.latitude, target.longitude);
                    self.speed_mps = config.cruise_speed_mps;
                    let travel = (self.speed_mps * dt).min(dist);
                    let bearing_rad = self.yaw_deg.to_radians();
                    self.lat += travel * bearing_rad.cos() / M_PER_DEG_LAT;
                    self.lon += travel * bearing_rad.sin()
                        / (M_PER_DEG_LAT * self.lat.to_radians().cos());
                }
            }
        } else {
            self.speed_mps = 0.0;
        }

        let noise_deg = config.gps_noise_m / M_PER_DEG_LAT;
        let lat_noise = rng.gen_range(-1.0..=1.0) * noise_deg;
        let lon_noise = rng.gen_range(-1.0..=1.0) * noise_deg;

        events.push(LinkEvent::Position {
            latitude: self.lat + lat_noise,
            longitude: self.lon + lon_noise,
            altitude_rel: 0.0,
        });
        events.push(LinkEvent::Attitude {
            roll_rad: 0.0,
            pitch_rad: 0.0,
            yaw_rad: self.yaw_deg.to_radians(),
        });
        events.push(LinkEvent::GroundSpeed(self.speed_mps));

        // Slower 1 Hz reports
        if self.step_count % config.event_rate_hz.max(1) as u64 == 0 {
            self.battery_voltage -= 0.0005;
            events.push(LinkEvent::Battery {
                voltage: self.battery_voltage,
                current: if self.speed_mps > 0.0 { 3.0 } else { 0.4 },
            });
            events.push(LinkEvent::AirSpeed(self.speed_mps));
        }

        self.step_count += 1;
        events
    }
}

/// Simulated vehicle link.
///
/// Create with [`SimLink::new`], then call [`spawn`](Self::spawn) to start
/// the event generator task.
pub struct SimLink {
    config: SimConfig,
    vehicle: Mutex<SimVehicle>,
    events: mpsc::Sender<LinkEvent>,
}

impl SimLink {
    pub fn new(config: SimConfig, events: mpsc::Sender<LinkEvent>) -> Arc<Self> {
        let vehicle = Mutex::new(SimVehicle::new(&config));
        Arc::new(Self {
            config,
            vehicle,
            events,
        })
    }

    /// Start the event generator.
    ///
    /// Runs until the event receiver is dropped.
    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let link = Arc::clone(self);
        tokio::spawn(async move {
            let mut rng = match link.config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut interval = tokio::time::interval(std::time::Duration::from_secs_f64(
                1.0 / link.config.event_rate_hz.max(1) as f64,
            ));
            loop {
                interval.tick().await;
                let events = {
                    let mut vehicle = link.vehicle.lock().await;
                    vehicle.step(&link.config, &mut rng)
                };
                for event in events {
                    if link.events.send(event).await.is_err() {
                        return; // receiver gone, shut down
                    }
                }
            }
        })
    }
}

#[async_trait]
impl VehicleLink for SimLink {
    async fn next_waypoint_index(&self) -> u16 {
        self.vehicle.lock().await.next_wp
    }

    async fn home_position(&self) -> Option<(f64, f64)> {
        Some((self.config.origin_lat_deg, self.config.origin_lon_deg))
    }

    async fn set_mode(&self, mode: &str) -> Result<(), RelayError> {
        {
            let mut vehicle = self.vehicle.lock().await;
            vehicle.mode = mode.to_string();
            if vehicle.is_autonomous() && vehicle.next_wp == 0 && !vehicle.mission.is_empty() {
                vehicle.next_wp = 1;
            }
        }
        self.events
            .send(LinkEvent::Mode(mode.to_string()))
            .await
            .map_err(|_| RelayError::Link("event channel closed".to_string()))
    }

    async fn upload_mission(&self, waypoints: &[Waypoint]) -> Result<(), RelayError> {
        let mut vehicle = self.vehicle.lock().await;
        vehicle.mission = waypoints.to_vec();
        vehicle.next_wp = if waypoints.is_empty() { 0 } else { 1 };
        Ok(())
    }

    async fn download_mission(&self) -> Result<Vec<Waypoint>, RelayError> {
        Ok(self.vehicle.lock().await.mission.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_first_step_emits_boot_reports() {
        let config = SimConfig::default();
        let mut vehicle = SimVehicle::new(&config);
        let events = vehicle.step(&config, &mut seeded_rng());

        assert!(matches!(events[0], LinkEvent::Mode(_)));
        assert!(matches!(events[1], LinkEvent::NavSpeedParam(_)));
        assert!(matches!(events[2], LinkEvent::GpsFix(3)));
    }

    #[test]
    fn test_step_deterministic_under_seed() {
        let config = SimConfig {
            gps_noise_m: 1.0,
            ..Default::default()
        };
        let mut v1 = SimVehicle::new(&config);
        let mut v2 = SimVehicle::new(&config);
        let mut r1 = seeded_rng();
        let mut r2 = seeded_rng();

        for _ in 0..20 {
            assert_eq!(v1.step(&config, &mut r1), v2.step(&config, &mut r2));
        }
    }

    #[test]
    fn test_holds_still_outside_autonomous_modes() {
        let config = SimConfig::default();
        let mut vehicle = SimVehicle::new(&config);
        vehicle.mission = vec![Waypoint::new(1, 35.68, 139.66, 0.0)];
        vehicle.next_wp = 1;

        let mut rng = seeded_rng();
        for _ in 0..10 {
            vehicle.step(&config, &mut rng);
        }
        assert_eq!(vehicle.lat, config.origin_lat_deg);
        assert_eq!(vehicle.speed_mps, 0.0);
    }

    #[test]
    fn test_drives_toward_waypoint_in_auto() {
        let config = SimConfig::default();
        let mut vehicle = SimVehicle::new(&config);
        // ~111m north of the origin
        vehicle.mission = vec![Waypoint::new(1, config.origin_lat_deg + 0.001, config.origin_lon_deg, 0.0)];
        vehicle.next_wp = 1;
        vehicle.mode = "AUTO".to_string();

        let start_dist = geo::distance_m(
            vehicle.lat,
            vehicle.lon,
            vehicle.mission[0].latitude,
            vehicle.mission[0].longitude,
        );
        let mut rng = seeded_rng();
        for _ in 0..50 {
            vehicle.step(&config, &mut rng);
        }
        let end_dist = geo::distance_m(
            vehicle.lat,
            vehicle.lon,
            vehicle.mission[0].latitude,
            vehicle.mission[0].longitude,
        );

        // 5 seconds at 2 m/s
        assert!(
            start_dist - end_dist > 8.0,
            "moved {}m",
            start_dist - end_dist
        );
        assert_eq!(vehicle.speed_mps, config.cruise_speed_mps);
    }

    #[test]
    fn test_advances_past_reached_waypoint() {
        let config = SimConfig::default();
        let mut vehicle = SimVehicle::new(&config);
        // First waypoint right under the vehicle, second further away
        vehicle.mission = vec![
            Waypoint::new(1, config.origin_lat_deg, config.origin_lon_deg, 0.0),
            Waypoint::new(2, config.origin_lat_deg + 0.001, config.origin_lon_deg, 0.0),
        ];
        vehicle.next_wp = 1;
        vehicle.mode = "AUTO".to_string();

        vehicle.step(&config, &mut seeded_rng());
        assert_eq!(vehicle.next_wp, 2);
    }

    #[test]
    fn test_stops_at_final_waypoint() {
        let config = SimConfig::default();
        let mut vehicle = SimVehicle::new(&config);
        vehicle.mission = vec![Waypoint::new(1, config.origin_lat_deg, config.origin_lon_deg, 0.0)];
        vehicle.next_wp = 1;
        vehicle.mode = "AUTO".to_string();
        vehicle.speed_mps = 2.0;

        vehicle.step(&config, &mut seeded_rng());
        assert_eq!(vehicle.next_wp, 1);
        assert_eq!(vehicle.speed_mps, 0.0);
    }

    #[tokio::test]
    async fn test_set_mode_emits_event_and_arms_mission() {
        let (tx, mut rx) = mpsc::channel(16);
        let link = SimLink::new(SimConfig::default(), tx);

        link.upload_mission(&[Waypoint::new(1, 35.68, 139.66, 0.0)])
            .await
            .unwrap();
        link.set_mode("AUTO").await.unwrap();

        assert_eq!(link.next_waypoint_index().await, 1);
        assert_eq!(rx.recv().await, Some(LinkEvent::Mode("AUTO".to_string())));
    }

    #[tokio::test]
    async fn test_upload_download_roundtrip() {
        let (tx, _rx) = mpsc::channel(16);
        let link = SimLink::new(SimConfig::default(), tx);

        let mission = vec![
            Waypoint::new(1, 35.0, 139.0, 10.0),
            Waypoint::new(2, 35.1, 139.1, 20.0),
        ];
        link.upload_mission(&mission).await.unwrap();

        assert_eq!(link.download_mission().await.unwrap(), mission);
        assert_eq!(link.next_waypoint_index().await, 1);
    }
}
