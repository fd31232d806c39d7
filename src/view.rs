//! Plain-data snapshot handed to map and list views.

use serde::Serialize;

use crate::drone::DroneId;
use crate::engine::FleetEngine;
use crate::geo::{Position, Waypoint};
use crate::persistence::KeyValueSlot;
use crate::state_machine::simulation::format_flight_time;

/// Path colors, assigned to drones by list position and reused cyclically.
pub const PATH_COLORS: [&str; 6] = [
    "#FF5733", "#33FF57", "#3357FF", "#F033FF", "#FF33A8", "#33FFF5",
];

pub fn path_color(index: usize) -> &'static str {
    PATH_COLORS[index % PATH_COLORS.len()]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroneView {
    pub id: DroneId,
    pub name: String,
    pub waypoints: Vec<Waypoint>,
    pub position: Option<Position>,
    /// Flown part of the path; only filled while the simulation is running.
    pub traveled: Vec<Position>,
    pub color: &'static str,
    pub is_active: bool,
}

/// Everything a map view needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapScene {
    pub drones: Vec<DroneView>,
    pub active_id: Option<DroneId>,
    pub is_running: bool,
    pub speed_multiplier: u8,
    pub progress: f64,
    /// Flight clock formatted as `m:ss`.
    pub flight_time: String,
    pub center: Option<Position>,
}

impl MapScene {
    pub fn capture<S: KeyValueSlot>(engine: &FleetEngine<S>) -> Self {
        let simulation = engine.simulation();
        let active_id = engine.active_id().cloned();

        let drones = engine
            .fleet()
            .iter()
            .enumerate()
            .map(|(index, drone)| DroneView {
                id: drone.id().clone(),
                name: drone.name().to_owned(),
                waypoints: drone.waypoints().to_vec(),
                position: engine.position_of(drone.id()),
                traveled: if simulation.is_running {
                    engine.traveled_path_of(drone.id())
                } else {
                    Vec::new()
                },
                color: path_color(index),
                is_active: active_id.as_ref() == Some(drone.id()),
            })
            .collect();

        Self {
            drones,
            active_id,
            is_running: simulation.is_running,
            speed_multiplier: simulation.speed_multiplier,
            progress: simulation.progress,
            flight_time: format_flight_time(engine.flight_time()),
            center: engine.map_center(),
        }
    }

    pub fn drone(&self, drone_id: &DroneId) -> Option<&DroneView> {
        self.drones.iter().find(|view| &view.id == drone_id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::persistence::{FleetPersistence, MemorySlot};

    fn wp(lat: f64, lng: f64) -> Waypoint {
        Waypoint::new(lat, lng, None).unwrap()
    }

    #[test]
    fn test_colors_cycle() {
        assert_eq!(path_color(0), "#FF5733");
        assert_eq!(path_color(6), "#FF5733");
        assert_eq!(path_color(7), "#33FF57");
    }

    #[test]
    fn test_capture_idle_fleet() {
        let mut engine = FleetEngine::new(
            FleetPersistence::with_default_key(MemorySlot::new()),
            Duration::from_secs(600),
        );
        let first = engine.add_drone("One").unwrap();
        let second = engine.add_drone("Two").unwrap();
        engine.add_waypoint(&second, wp(0.0, 0.0)).unwrap();

        let scene = MapScene::capture(&engine);
        assert_eq!(scene.drones.len(), 2);
        assert_eq!(scene.active_id, Some(second.clone()));
        assert!(!scene.drone(&first).unwrap().is_active);
        assert!(scene.drone(&second).unwrap().is_active);
        assert_eq!(scene.drone(&second).unwrap().color, "#33FF57");
        assert_eq!(scene.drone(&second).unwrap().position, None);
        assert_eq!(scene.flight_time, "0:00");
    }

    #[test]
    fn test_capture_running_fleet() {
        let mut engine = FleetEngine::new(
            FleetPersistence::with_default_key(MemorySlot::new()),
            Duration::from_secs(600),
        );
        let id = engine.add_drone("Scout").unwrap();
        engine.add_waypoint(&id, wp(0.0, 0.0)).unwrap();
        engine.add_waypoint(&id, wp(0.0, 2.0)).unwrap();
        engine.toggle_simulation().unwrap();
        engine.tick(Duration::from_secs(150));

        let scene = MapScene::capture(&engine);
        let view = scene.drone(&id).unwrap();
        assert!(scene.is_running);
        assert_eq!(scene.flight_time, "2:30");
        assert!((view.position.unwrap().lng - 0.5).abs() < 1e-9);
        assert_eq!(view.traveled.len(), 2);
    }
}
