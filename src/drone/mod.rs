pub mod error;

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::geo::Waypoint;

use self::error::EmptyDroneName;

/// The identifier of a drone within the fleet.
///
/// Generated ids look like `drone-<unix millis>-<random suffix>`, imported ids can be any string.
/// Cloning is cheap since the string is shared.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DroneId(Arc<str>);

impl DroneId {
    /// Create a new [`DroneId`] from any type that can be converted into an `Arc<str>`.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id from the wall clock plus a random suffix, so that several ids created
    /// within the same millisecond still differ.
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        let suffix = Uuid::new_v4().simple().to_string();

        Self::new(format!("drone-{millis}-{}", &suffix[..8]))
    }

    /// Returns the underlying string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DroneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DroneId({})", self.0)
    }
}

impl fmt::Display for DroneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DroneId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for DroneId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl Serialize for DroneId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DroneId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(DroneId::from)
    }
}

/// A simulated drone and its ordered flight path.
///
/// The live position is not part of the record: it is derived from the path and the simulation
/// progress whenever it is needed, so a persisted drone never carries stale simulation output.
///
/// Records only enter the fleet through [`Drone::new`] or the [`import`](crate::import) validator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drone {
    id: DroneId,
    name: String,
    waypoints: Vec<Waypoint>,
}

impl Drone {
    /// Create a drone with an empty path. The name is trimmed and must not end up empty.
    pub fn new(id: DroneId, name: &str) -> Result<Self, EmptyDroneName> {
        Self::with_waypoints(id, name, Vec::new())
    }

    pub fn with_waypoints(
        id: DroneId,
        name: &str,
        waypoints: Vec<Waypoint>,
    ) -> Result<Self, EmptyDroneName> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EmptyDroneName);
        }

        Ok(Self {
            id,
            name: name.to_owned(),
            waypoints,
        })
    }

    pub fn id(&self) -> &DroneId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The flight path in traversal order.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Whether the path has enough waypoints to be flown.
    pub fn is_flyable(&self) -> bool {
        self.waypoints.len() >= 2
    }

    /// Append a waypoint to the end of the path, returning its index.
    pub(crate) fn push_waypoint(&mut self, waypoint: Waypoint) -> usize {
        self.waypoints.push(waypoint);
        self.waypoints.len() - 1
    }

    /// Remove the waypoint at `index`, shifting later waypoints down by one.
    pub(crate) fn remove_waypoint(&mut self, index: usize) -> Option<Waypoint> {
        (index < self.waypoints.len()).then(|| self.waypoints.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(lat: f64, lng: f64) -> Waypoint {
        Waypoint::new(lat, lng, None).unwrap()
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let ids: Vec<DroneId> = (0..500).map(|_| DroneId::generate()).collect();
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.iter().all(|id| id.as_str().starts_with("drone-")));
    }

    #[test]
    fn test_blank_name_rejected() {
        assert_eq!(Drone::new(DroneId::from("d"), "   "), Err(EmptyDroneName));
    }

    #[test]
    fn test_name_is_trimmed() {
        let drone = Drone::new(DroneId::from("d"), "  Scout ").unwrap();
        assert_eq!(drone.name(), "Scout");
    }

    #[test]
    fn test_remove_waypoint_shifts_rest() {
        let mut drone = Drone::new(DroneId::from("d"), "Scout").unwrap();
        drone.push_waypoint(wp(1.0, 1.0));
        drone.push_waypoint(wp(2.0, 2.0));
        drone.push_waypoint(wp(3.0, 3.0));

        assert_eq!(drone.remove_waypoint(1), Some(wp(2.0, 2.0)));
        assert_eq!(drone.waypoints(), &[wp(1.0, 1.0), wp(3.0, 3.0)]);
        assert_eq!(drone.remove_waypoint(2), None);
    }

    #[test]
    fn test_drone_serializes_without_position() {
        let mut drone = Drone::new(DroneId::from("drone-1"), "Scout").unwrap();
        drone.push_waypoint(wp(51.5, -0.09));

        let value = serde_json::to_value(&drone).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "drone-1",
                "name": "Scout",
                "waypoints": [{"lat": 51.5, "lng": -0.09}],
            })
        );
    }
}
