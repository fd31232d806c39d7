//! The authoritative fleet state and its mutation operations.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::drone::{Drone, DroneId};
use crate::fleet::Fleet;
use crate::fleet::error::{DroneNotFound, WaypointError};
use crate::geo::Waypoint;
use crate::persistence::{FleetPersistence, KeyValueSlot};

/// An immutable view of the store published after every change.
///
/// Readers must re-read the latest snapshot after a change notification rather than keep an old
/// one around.
#[derive(Debug, Clone, Default)]
pub struct FleetSnapshot {
    pub fleet: Arc<Fleet>,
    pub active_id: Option<DroneId>,
    pub revision: u64,
}

/// Owns the [`Fleet`] and the active drone selection.
///
/// Every successful fleet mutation writes the whole fleet to the persistence slot and publishes a
/// fresh [`FleetSnapshot`]. A failed write is logged and otherwise ignored; the in-memory state
/// stays authoritative.
///
/// Waypoints are addressed by index. An index is only meaningful until the next removal on the
/// same drone, so callers must recompute indices instead of caching them.
#[derive(Debug)]
pub struct FleetStore<S> {
    fleet: Fleet,
    active_id: Option<DroneId>,
    persistence: FleetPersistence<S>,
    revision: u64,
    snapshots: watch::Sender<FleetSnapshot>,
}

impl<S: KeyValueSlot> FleetStore<S> {
    /// Construct a store from whatever the persistence slot currently holds.
    pub fn open(persistence: FleetPersistence<S>) -> Self {
        let fleet = persistence.load();
        info!(drones = fleet.len(), "Fleet store opened");

        let (snapshots, _) = watch::channel(FleetSnapshot {
            fleet: Arc::new(fleet.clone()),
            active_id: None,
            revision: 0,
        });

        Self {
            fleet,
            active_id: None,
            persistence,
            revision: 0,
            snapshots,
        }
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn drone(&self, drone_id: &DroneId) -> Option<&Drone> {
        self.fleet.get(drone_id)
    }

    pub fn active_id(&self) -> Option<&DroneId> {
        self.active_id.as_ref()
    }

    pub fn active_drone(&self) -> Option<&Drone> {
        self.active_id.as_ref().and_then(|id| self.fleet.get(id))
    }

    pub fn persistence(&self) -> &FleetPersistence<S> {
        &self.persistence
    }

    /// Subscribe to snapshots. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<FleetSnapshot> {
        self.snapshots.subscribe()
    }

    /// The current state as a snapshot.
    pub fn snapshot(&self) -> FleetSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Create a drone with an empty path and make it the active selection.
    ///
    /// Returns `None` without touching the fleet when `name` is blank.
    pub fn add_drone(&mut self, name: &str) -> Option<DroneId> {
        let drone_id = loop {
            let candidate = DroneId::generate();
            if !self.fleet.contains(&candidate) {
                break candidate;
            }
        };

        let drone = match Drone::new(drone_id.clone(), name) {
            Ok(drone) => drone,
            Err(e) => {
                debug!(error = %e, "Ignoring add_drone");
                return None;
            }
        };

        // The id was checked free above.
        let _ = self.fleet.insert(drone);
        self.active_id = Some(drone_id.clone());

        info!(drone_id = %drone_id, name = %name.trim(), "Drone added");
        self.commit();
        Some(drone_id)
    }

    /// Remove a drone, clearing the active selection if it pointed at it.
    ///
    /// Returns whether a drone was removed; an unknown id is a no-op.
    pub fn remove_drone(&mut self, drone_id: &DroneId) -> bool {
        if self.fleet.remove(drone_id).is_err() {
            debug!(drone_id = %drone_id, "Ignoring remove of unknown drone");
            return false;
        }

        if self.active_id.as_ref() == Some(drone_id) {
            self.active_id = None;
        }

        info!(drone_id = %drone_id, "Drone removed");
        self.commit();
        true
    }

    /// Append a waypoint to the end of a drone's path, returning its index.
    pub fn add_waypoint(
        &mut self,
        drone_id: &DroneId,
        waypoint: Waypoint,
    ) -> Result<usize, DroneNotFound> {
        let index = self.fleet.get_mut(drone_id)?.push_waypoint(waypoint);

        debug!(
            drone_id = %drone_id,
            index,
            lat = waypoint.lat(),
            lng = waypoint.lng(),
            "Waypoint added"
        );
        self.commit();
        Ok(index)
    }

    /// Remove the waypoint at `index`, shifting later waypoints down by one.
    pub fn remove_waypoint(
        &mut self,
        drone_id: &DroneId,
        index: usize,
    ) -> Result<Waypoint, WaypointError> {
        let drone = self.fleet.get_mut(drone_id)?;
        let len = drone.waypoints().len();
        let waypoint = drone
            .remove_waypoint(index)
            .ok_or_else(|| WaypointError::IndexOutOfRange {
                drone_id: drone_id.clone(),
                index,
                len,
            })?;

        debug!(drone_id = %drone_id, index, "Waypoint removed");
        self.commit();
        Ok(waypoint)
    }

    /// Replace the entire fleet. The active selection survives only if its drone does.
    pub fn import_fleet(&mut self, fleet: Fleet) {
        if let Some(active) = &self.active_id {
            if !fleet.contains(active) {
                self.active_id = None;
            }
        }

        info!(drones = fleet.len(), "Fleet imported");
        self.fleet = fleet;
        self.commit();
    }

    /// Change the active selection. Selecting an unknown drone is rejected.
    pub fn set_active(&mut self, drone_id: Option<DroneId>) -> Result<(), DroneNotFound> {
        if let Some(id) = &drone_id {
            if !self.fleet.contains(id) {
                return Err(DroneNotFound {
                    drone_id: id.clone(),
                });
            }
        }

        if self.active_id != drone_id {
            self.active_id = drone_id;
            self.publish();
        }
        Ok(())
    }

    fn commit(&mut self) {
        // Save failures are logged by the persistence layer and never undo the mutation.
        let _ = self.persistence.save(&self.fleet);
        self.publish();
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.snapshots.send_replace(FleetSnapshot {
            fleet: Arc::new(self.fleet.clone()),
            active_id: self.active_id.clone(),
            revision: self.revision,
        });
    }
}
