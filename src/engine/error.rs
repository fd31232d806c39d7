use crate::drone::DroneId;

/// Reasons a simulation cannot be started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("no drone is selected")]
    NoActiveDrone,

    #[error("drone {drone_id} needs at least 2 waypoints to fly, it has {count}")]
    NotEnoughWaypoints { drone_id: DroneId, count: usize },
}
