use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::drone::{Drone, DroneId};

use self::error::{DroneAlreadyPresent, DroneNotFound};

pub mod error;

/// The complete collection of drones, keyed by [`DroneId`].
///
/// Keys are unique. Insertion order is kept so list views render drones in a stable order, but it
/// plays no part in equality: two fleets are equal when they hold the same drones.
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    drones: HashMap<DroneId, Drone, ahash::RandomState>,
    order: Vec<DroneId>,
}

impl Fleet {
    /// Construct a new empty [`Fleet`].
    pub fn new() -> Fleet {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.drones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drones.is_empty()
    }

    pub fn contains(&self, drone_id: &DroneId) -> bool {
        self.drones.contains_key(drone_id)
    }

    pub fn get(&self, drone_id: &DroneId) -> Option<&Drone> {
        self.drones.get(drone_id)
    }

    pub(crate) fn get_mut(&mut self, drone_id: &DroneId) -> Result<&mut Drone, DroneNotFound> {
        self.drones.get_mut(drone_id).ok_or_else(|| DroneNotFound {
            drone_id: drone_id.clone(),
        })
    }

    /// Add a drone tracked by its own id. Fails if the id is already taken.
    pub fn insert(&mut self, drone: Drone) -> Result<(), DroneAlreadyPresent> {
        if self.drones.contains_key(drone.id()) {
            return Err(DroneAlreadyPresent {
                drone_id: drone.id().clone(),
            });
        }

        self.order.push(drone.id().clone());
        self.drones.insert(drone.id().clone(), drone);
        Ok(())
    }

    /// Add or replace a drone. A replaced drone keeps its original position in the order.
    pub fn upsert(&mut self, drone: Drone) -> Option<Drone> {
        let drone_id = drone.id().clone();
        let previous = self.drones.insert(drone_id.clone(), drone);
        if previous.is_none() {
            self.order.push(drone_id);
        }
        previous
    }

    /// Remove the drone for the provided `drone_id`.
    pub fn remove(&mut self, drone_id: &DroneId) -> Result<Drone, DroneNotFound> {
        let drone = self.drones.remove(drone_id).ok_or_else(|| DroneNotFound {
            drone_id: drone_id.clone(),
        })?;
        self.order.retain(|id| id != drone_id);

        Ok(drone)
    }

    /// Drones in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Drone> {
        self.order.iter().filter_map(|id| self.drones.get(id))
    }

    /// Drone ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &DroneId> {
        self.order.iter()
    }
}

impl PartialEq for Fleet {
    fn eq(&self, other: &Self) -> bool {
        self.drones == other.drones
    }
}

impl FromIterator<Drone> for Fleet {
    fn from_iter<I: IntoIterator<Item = Drone>>(iter: I) -> Self {
        let mut fleet = Fleet::new();
        for drone in iter {
            fleet.upsert(drone);
        }
        fleet
    }
}

/// Serialized as a JSON object keyed by drone id, in insertion order.
impl Serialize for Fleet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for drone in self.iter() {
            map.serialize_entry(drone.id(), drone)?;
        }
        map.end()
    }
}
