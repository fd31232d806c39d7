//! Load and save the whole fleet to a single named slot.

pub mod error;
pub mod slot;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::fleet::Fleet;
use crate::import;

pub use self::error::{PersistenceError, SlotError};
pub use self::slot::{FileSlot, KeyValueSlot, MemorySlot};

/// The slot name the fleet is stored under unless configured otherwise.
pub const DEFAULT_FLEET_KEY: &str = "drones";

/// Reads and writes the fleet as a JSON object keyed by drone id.
#[derive(Debug)]
pub struct FleetPersistence<S> {
    slot: S,
    key: String,
}

impl<S: KeyValueSlot> FleetPersistence<S> {
    pub fn new(slot: S, key: impl Into<String>) -> Self {
        Self {
            slot,
            key: key.into(),
        }
    }

    pub fn with_default_key(slot: S) -> Self {
        Self::new(slot, DEFAULT_FLEET_KEY)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Load the stored fleet.
    ///
    /// A missing, unreadable or malformed slot yields an empty fleet; failures are logged rather
    /// than returned.
    pub fn load(&self) -> Fleet {
        match self.try_load() {
            Ok(Some(fleet)) => fleet,
            Ok(None) => {
                debug!(key = %self.key, "No stored fleet, starting empty");
                Fleet::new()
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to load stored fleet, starting empty");
                Fleet::new()
            }
        }
    }

    /// Load the stored fleet, surfacing why it could not be read.
    pub fn try_load(&self) -> Result<Option<Fleet>, PersistenceError> {
        let Some(raw) = self.slot.read(&self.key)? else {
            return Ok(None);
        };

        let value: Value = serde_json::from_str(&raw).map_err(PersistenceError::Syntax)?;
        Ok(Some(import::normalize(&value)?))
    }

    /// Serialize the full fleet and overwrite the slot with it.
    pub fn save(&self, fleet: &Fleet) -> Result<(), PersistenceError> {
        let result = serde_json::to_string(fleet)
            .map_err(PersistenceError::Serialize)
            .and_then(|json| {
                self.slot
                    .write(&self.key, &json)
                    .map_err(PersistenceError::from)
            });

        match &result {
            Ok(()) => debug!(key = %self.key, drones = fleet.len(), "Saved fleet"),
            Err(e) => error!(key = %self.key, error = %e, "Failed to save fleet"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drone::{Drone, DroneId};
    use crate::geo::Waypoint;

    fn sample_fleet() -> Fleet {
        let path = vec![
            Waypoint::new(51.5, -0.09, None).unwrap(),
            Waypoint::new(51.6, -0.08, Some(120.0)).unwrap(),
        ];
        [
            Drone::with_waypoints(DroneId::from("drone-1"), "Scout", path).unwrap(),
            Drone::new(DroneId::from("drone-2"), "Hawk").unwrap(),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let persistence = FleetPersistence::with_default_key(MemorySlot::new());
        let fleet = sample_fleet();

        persistence.save(&fleet).unwrap();
        let loaded = persistence.load();

        assert_eq!(loaded, fleet);
        let ids: Vec<&str> = loaded.ids().map(DroneId::as_str).collect();
        assert_eq!(ids, ["drone-1", "drone-2"]);
    }

    #[test]
    fn test_full_precision_coordinates_round_trip() {
        // Irrational-step sweep: every coordinate uses all 17 significant digits.
        let mut path = vec![Waypoint::new(60.858867901264716, -97.99467683768424, None).unwrap()];
        path.extend((1..2_000).map(|i| {
            let t = (f64::from(i) * 0.618_033_988_749_894_9).fract();
            let u = (f64::from(i) * 0.414_213_562_373_095_1).fract();
            Waypoint::new(180.0 * t - 90.0, 360.0 * u - 180.0, Some(1_000.0 * u)).unwrap()
        }));
        let fleet: Fleet = [Drone::with_waypoints(DroneId::from("drone-1"), "Scout", path).unwrap()]
            .into_iter()
            .collect();

        let persistence = FleetPersistence::with_default_key(MemorySlot::new());
        persistence.save(&fleet).unwrap();

        assert_eq!(persistence.load(), fleet);
    }

    #[test]
    fn test_empty_fleet_round_trips() {
        let persistence = FleetPersistence::with_default_key(MemorySlot::new());
        persistence.save(&Fleet::new()).unwrap();
        assert!(persistence.try_load().unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_missing_slot_loads_empty() {
        let persistence = FleetPersistence::with_default_key(MemorySlot::new());
        assert!(persistence.try_load().unwrap().is_none());
        assert!(persistence.load().is_empty());
    }

    #[test]
    fn test_corrupt_slot_loads_empty() {
        let slot = MemorySlot::new();
        slot.write(DEFAULT_FLEET_KEY, "{{{ not json").unwrap();
        let persistence = FleetPersistence::with_default_key(slot);

        assert!(matches!(
            persistence.try_load(),
            Err(PersistenceError::Syntax(_))
        ));
        assert!(persistence.load().is_empty());
    }

    #[test]
    fn test_wrong_shape_loads_empty() {
        let slot = MemorySlot::new();
        slot.write(DEFAULT_FLEET_KEY, "42").unwrap();
        let persistence = FleetPersistence::with_default_key(slot);

        assert!(matches!(
            persistence.try_load(),
            Err(PersistenceError::Shape(_))
        ));
        assert!(persistence.load().is_empty());
    }

    #[test]
    fn test_custom_key() {
        let persistence = FleetPersistence::new(MemorySlot::new(), "other");
        persistence.save(&sample_fleet()).unwrap();

        assert!(persistence.slot().read("other").unwrap().is_some());
        assert!(persistence.slot().read(DEFAULT_FLEET_KEY).unwrap().is_none());
    }
}
