//! Relay service orchestration.
//!
//! Wires the event stream, the command channel, and the periodic telemetry
//! tick around the shared navigation state and mission store.
//!
//! # Concurrency
//!
//! Two flows race on the shared state: link events mutate
//! [`NavigationState`], and the fixed-rate tick reads it together with the
//! [`MissionStore`]. Both live behind `tokio::sync::RwLock`; every path
//! acquires the mission lock before the state lock, so the two flows cannot
//! deadlock. A position event applies as one unit under the state write
//! lock, and the tick computes ETAs while holding a single mission read
//! guard, so the published list length always matches the mission the tick
//! saw.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::link::{ConsoleCommand, TelemetrySink, VehicleLink};
use crate::mission::source::normalize_mission_name;
use crate::mission::{parse_mission_file, MissionSource, MissionStore};
use crate::nav::eta::{self, EtaEntry};
use crate::nav::{LinkEvent, NavigationState};
use crate::telemetry::TelemetrySnapshot;

/// Telemetry relay service.
///
/// Owns the navigation state and mission store; the link, mission source,
/// and sink are external collaborators supplied at construction.
pub struct TelemetryRelay {
    config: RelayConfig,
    state: Arc<RwLock<NavigationState>>,
    mission: Arc<RwLock<MissionStore>>,
    link: Arc<dyn VehicleLink>,
    source: Arc<dyn MissionSource>,
    sink: Arc<dyn TelemetrySink>,
}

impl TelemetryRelay {
    pub fn new(
        config: RelayConfig,
        link: Arc<dyn VehicleLink>,
        source: Arc<dyn MissionSource>,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        let state = NavigationState::new(config.fallback_speed_mps());
        Self {
            config,
            state: Arc::new(RwLock::new(state)),
            mission: Arc::new(RwLock::new(MissionStore::new())),
            link,
            source,
            sink,
        }
    }

    /// Shared navigation state handle.
    pub fn state(&self) -> Arc<RwLock<NavigationState>> {
        Arc::clone(&self.state)
    }

    /// Shared mission store handle.
    pub fn mission(&self) -> Arc<RwLock<MissionStore>> {
        Arc::clone(&self.mission)
    }

    /// Seed the mission store from whatever the vehicle already carries.
    ///
    /// Called once at startup so arrival estimates work before the first
    /// console command. A failed download is logged and leaves the store
    /// empty.
    pub async fn seed_mission_from_vehicle(&self) {
        match self.link.download_mission().await {
            Ok(waypoints) => {
                let count = waypoints.len();
                self.mission.write().await.replace(waypoints);
                info!(waypoints = count, "seeded mission from vehicle");
            }
            Err(e) => warn!(error = %e, "initial mission download failed"),
        }
    }

    /// Spawn the task applying link events to the navigation state.
    pub fn spawn_event_task(
        self: &Arc<Self>,
        mut events: mpsc::Receiver<LinkEvent>,
    ) -> tokio::task::JoinHandle<()> {
        let relay = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                // Mission lock before state lock, as everywhere
                let mission = relay.mission.read().await;
                let mut state = relay.state.write().await;
                state.apply(event, &mission);
            }
        })
    }

    /// Spawn the task serving console commands.
    pub fn spawn_command_task(
        self: &Arc<Self>,
        mut commands: mpsc::Receiver<ConsoleCommand>,
    ) -> tokio::task::JoinHandle<()> {
        let relay = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(command) = commands.recv().await {
                relay.handle_command(command).await;
            }
        })
    }

    /// Serve one console command.
    ///
    /// Fetch/parse/upload failures are reported to the operator log and
    /// never propagate; the previous mission stays active and the tick
    /// loop keeps publishing.
    pub async fn handle_command(&self, command: ConsoleCommand) {
        if !command.mission.is_empty() {
            let name = normalize_mission_name(&command.mission);
            match self.install_mission(&name).await {
                Ok(count) => info!(mission = %name, waypoints = count, "mission installed"),
                Err(e) => warn!(mission = %name, error = %e, "mission load failed, keeping previous"),
            }
        }

        if !command.mode.is_empty() {
            match self.link.set_mode(&command.mode).await {
                Ok(()) => info!(mode = %command.mode, "mode change requested"),
                Err(e) => warn!(mode = %command.mode, error = %e, "mode change failed"),
            }
        }
    }

    /// Fetch a mission by name, install it, and re-upload it to the vehicle.
    ///
    /// The in-memory store is authoritative: an upload rejection is logged
    /// and does not roll the new mission back. Returns the installed
    /// waypoint count.
    pub async fn install_mission(&self, name: &str) -> Result<usize, RelayError> {
        let content = self.source.fetch(name).await?;
        let waypoints = parse_mission_file(&content)?;
        let count = waypoints.len();

        self.mission.write().await.replace(waypoints.clone());

        if let Err(e) = self.link.upload_mission(&waypoints).await {
            warn!(error = %e, "mission upload rejected, in-memory mission stays active");
        }

        Ok(count)
    }

    /// Run one telemetry tick: poll the link, refresh derived state,
    /// estimate arrivals, and assemble a snapshot.
    pub async fn tick(&self) -> TelemetrySnapshot {
        let next_wp = self.link.next_waypoint_index().await;
        let home = self.link.home_position().await;

        // Mission lock before state lock, as everywhere; both guards stay
        // held through the estimate so the ETA list cannot outlive the
        // mission it was computed against.
        let mission = self.mission.read().await;
        let mut state = self.state.write().await;
        state.set_next_wp(next_wp);
        state.update_home(home);
        state.refresh_distance_to_home();

        let eta: Vec<EtaEntry> = if state.mode == "AUTO" && next_wp != 0 {
            eta::estimate(
                next_wp,
                state.latitude,
                state.longitude,
                &mission,
                state.ground_speed,
                state.fallback_speed_mps,
                self.config.stall_speed_mps,
                Local::now(),
            )
        } else {
            Vec::new()
        };

        debug!(
            mode = %state.mode,
            next_wp,
            lat = state.latitude,
            lon = state.longitude,
            ground_speed = state.ground_speed,
            travelled = state.distance_travelled,
            to_home = state.distance_to_home,
            "tick"
        );

        TelemetrySnapshot::build(&state, &eta, self.config.vehicle_id)
    }

    /// Run the relay until the process is stopped.
    ///
    /// Spawns the event and command tasks, then drives the publish tick at
    /// the configured rate. Publish failures are logged and the loop keeps
    /// going.
    pub async fn run(
        self: Arc<Self>,
        events: mpsc::Receiver<LinkEvent>,
        commands: mpsc::Receiver<ConsoleCommand>,
    ) {
        self.seed_mission_from_vehicle().await;
        self.spawn_event_task(events);
        self.spawn_command_task(commands);

        let mut interval = tokio::time::interval(self.config.tick_interval());
        loop {
            interval.tick().await;
            let snapshot = self.tick().await;
            if let Err(e) = self.sink.publish(&snapshot).await {
                warn!(error = %e, "telemetry publish failed");
            }
        }
    }
}
