//! Composition root tying the fleet store, the simulation and the operator-facing extras together.

pub mod error;

use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::drone::DroneId;
use crate::fleet::Fleet;
use crate::fleet::error::{DroneNotFound, WaypointError};
use crate::geo::{Position, Waypoint};
use crate::geocode::{GeocodeError, Place};
use crate::import::{self, ImportError};
use crate::notice::Notice;
use crate::path;
use crate::persistence::{FleetPersistence, KeyValueSlot};
use crate::state_machine::StateMachine;
use crate::state_machine::simulation::{
    SimulationClock, SimulationInput, SimulationMachine, SimulationOutput, SimulationState,
};
use crate::state_machine::wrappers::input::SystemInput;
use crate::store::{FleetSnapshot, FleetStore};

pub use self::error::SimulationError;

const NOTICE_CAPACITY: usize = 32;

/// The fleet simulation engine.
///
/// Owns the [`FleetStore`], the simulation state and the map center override. All mutation goes
/// through `&mut self`, so operations apply strictly in call order. Views observe the engine via
/// [`subscribe`](Self::subscribe) and [`subscribe_notices`](Self::subscribe_notices) or capture a
/// [`MapScene`](crate::view::MapScene).
#[derive(Debug)]
pub struct FleetEngine<S> {
    store: FleetStore<S>,
    clock: SimulationClock,
    map_center: Option<Position>,
    notices: broadcast::Sender<Notice>,
}

impl<S: KeyValueSlot> FleetEngine<S> {
    pub fn new(persistence: FleetPersistence<S>, flight_duration: Duration) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        Self {
            store: FleetStore::open(persistence),
            clock: SimulationClock::new(SimulationMachine::new(flight_duration)),
            map_center: None,
            notices,
        }
    }

    pub fn store(&self) -> &FleetStore<S> {
        &self.store
    }

    pub fn fleet(&self) -> &Fleet {
        self.store.fleet()
    }

    pub fn active_id(&self) -> Option<&DroneId> {
        self.store.active_id()
    }

    pub fn simulation(&self) -> SimulationState {
        self.clock.machine().state()
    }

    /// Flight-clock time corresponding to the current progress.
    pub fn flight_time(&self) -> Duration {
        self.clock.machine().flight_time()
    }

    pub fn map_center(&self) -> Option<Position> {
        self.map_center
    }

    pub fn subscribe(&self) -> watch::Receiver<FleetSnapshot> {
        self.store.subscribe()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn add_drone(&mut self, name: &str) -> Option<DroneId> {
        self.store.add_drone(name)
    }

    /// Remove a drone. Removing the drone a running simulation is showing also resets the run.
    pub fn remove_drone(&mut self, drone_id: &DroneId) -> bool {
        let was_active = self.store.active_id() == Some(drone_id);
        let removed = self.store.remove_drone(drone_id);

        if removed && was_active && self.simulation().is_running {
            self.reset_simulation();
        }
        removed
    }

    pub fn select_drone(&mut self, drone_id: Option<DroneId>) -> Result<(), DroneNotFound> {
        self.store.set_active(drone_id)
    }

    pub fn add_waypoint(
        &mut self,
        drone_id: &DroneId,
        waypoint: Waypoint,
    ) -> Result<usize, DroneNotFound> {
        self.store.add_waypoint(drone_id, waypoint)
    }

    pub fn remove_waypoint(
        &mut self,
        drone_id: &DroneId,
        index: usize,
    ) -> Result<Waypoint, WaypointError> {
        self.store.remove_waypoint(drone_id, index)
    }

    /// Replace the fleet with an already validated one.
    ///
    /// If the fleet no longer contains the drone a running simulation is showing, the run is reset.
    pub fn import_fleet(&mut self, fleet: Fleet) {
        let had_active = self.store.active_id().is_some();
        self.store.import_fleet(fleet);

        if had_active && self.store.active_id().is_none() && self.simulation().is_running {
            self.reset_simulation();
        }
    }

    /// Validate an arbitrary JSON value and replace the fleet with the result.
    ///
    /// Returns the number of imported drones. On error the fleet is left untouched.
    pub fn import_value(&mut self, value: &Value) -> Result<usize, ImportError> {
        let result = import::normalize(value);
        self.finish_import(result)
    }

    /// Validate an uploaded file and replace the fleet with its content.
    pub fn import_document(
        &mut self,
        content_type: Option<&str>,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<usize, ImportError> {
        let result = import::parse_document(content_type, file_name, bytes);
        self.finish_import(result)
    }

    fn finish_import(&mut self, result: Result<Fleet, ImportError>) -> Result<usize, ImportError> {
        match result {
            Ok(fleet) => {
                let count = fleet.len();
                self.import_fleet(fleet);
                self.notify(Notice::info(
                    "Import Complete",
                    format!("Imported {count} drone(s)"),
                ));
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "Import rejected");
                self.notify(Notice::error("Import Failed", e.to_string()));
                Err(e)
            }
        }
    }

    /// The current fleet as pretty-printed JSON in the keyed-object shape.
    pub fn export_string(&self) -> Result<String, serde_json::Error> {
        import::export_string(self.store.fleet())
    }

    /// Start or pause the simulation, returning whether it is now running.
    ///
    /// Starting requires an active drone with at least 2 waypoints. Pausing always succeeds.
    pub fn toggle_simulation(&mut self) -> Result<bool, SimulationError> {
        if !self.simulation().is_running {
            let drone = self
                .store
                .active_drone()
                .ok_or(SimulationError::NoActiveDrone)?;

            if !drone.is_flyable() {
                return Err(SimulationError::NotEnoughWaypoints {
                    drone_id: drone.id().clone(),
                    count: drone.waypoints().len(),
                });
            }
        }

        self.process(SimulationInput::Toggle);
        let running = self.simulation().is_running;
        info!(running, "Simulation toggled");
        Ok(running)
    }

    pub fn set_simulation_speed(&mut self, speed: i64) {
        self.process(SimulationInput::SetSpeed(speed));
    }

    pub fn set_simulation_progress(&mut self, progress: f64) {
        self.process(SimulationInput::SetProgress(progress));
    }

    pub fn reset_simulation(&mut self) {
        self.process(SimulationInput::Reset);
        debug!("Simulation reset");
    }

    /// Advance the simulation by an explicit amount of wall-clock time.
    pub fn tick(&mut self, elapsed: Duration) {
        self.process(SimulationInput::Tick(elapsed));
    }

    /// Advance the simulation by the wall-clock time since the previous call.
    pub fn tick_now(&mut self) {
        self.clock.process_input(SystemInput::<_, Instant>::system());
    }

    /// Poll the next pending simulation event.
    pub fn poll_simulation(&mut self) -> Option<SimulationOutput> {
        self.clock.poll_output()
    }

    fn process(&mut self, input: SimulationInput) {
        self.clock.process_input(SystemInput::Input(input));
    }

    pub fn set_map_center(&mut self, center: Position) {
        self.map_center = Some(center);
    }

    /// Center the map on a search result and, if a drone is selected, append it as a waypoint.
    ///
    /// Returns the index of the added waypoint, `None` when no drone is selected.
    pub fn add_waypoint_from_place(
        &mut self,
        place: &Place,
    ) -> Result<Option<usize>, GeocodeError> {
        let position = place.coordinates()?;
        self.set_map_center(position);

        let Some(drone_id) = self.store.active_id().cloned() else {
            return Ok(None);
        };

        let waypoint = Waypoint::new(position.lat, position.lng, None).map_err(|_| {
            GeocodeError::InvalidCoordinates {
                place_id: place.place_id,
                lat: place.lat.clone(),
                lon: place.lon.clone(),
            }
        })?;

        // The id was read from the store's own selection just above.
        let index = self.store.add_waypoint(&drone_id, waypoint).ok();
        if index.is_some() {
            self.notify(Notice::info(
                "Waypoint Added",
                format!("Added {} as a waypoint", place.short_name()),
            ));
        }
        Ok(index)
    }

    /// Surface a failed place search to the operator.
    pub fn report_search_error(&self, error: &GeocodeError) {
        warn!(error = %error, "Place search failed");
        self.notify(Notice::error(
            "Search Error",
            "Failed to search for locations. Please try again.",
        ));
    }

    /// Whether positions are shown: the simulation is running or has made progress.
    pub fn has_started(&self) -> bool {
        let state = self.simulation();
        state.is_running || state.progress > 0.0
    }

    /// The derived position of a drone at the current progress.
    ///
    /// `None` before the simulation has started, for unknown drones and for empty paths.
    pub fn position_of(&self, drone_id: &DroneId) -> Option<Position> {
        if !self.has_started() {
            return None;
        }

        let drone = self.store.drone(drone_id)?;
        path::position_at(drone.waypoints(), self.simulation().progress)
    }

    pub fn active_position(&self) -> Option<Position> {
        self.position_of(self.store.active_id()?)
    }

    /// The part of a drone's path flown so far, ending at its current position.
    pub fn traveled_path_of(&self, drone_id: &DroneId) -> Vec<Position> {
        match self.store.drone(drone_id) {
            Some(drone) if self.has_started() => {
                path::traveled_path(drone.waypoints(), self.simulation().progress)
            }
            _ => Vec::new(),
        }
    }

    fn notify(&self, notice: Notice) {
        // Nobody listening is fine.
        let _ = self.notices.send(notice);
    }
}
