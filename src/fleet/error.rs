use crate::drone::DroneId;

/// Indicates that an operation to add a drone failed because one with the same id already exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("the provided drone id ({drone_id}) is already present")]
pub struct DroneAlreadyPresent {
    pub drone_id: DroneId,
}

/// Indicates that an operation targeting a drone failed because it doesn't exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("the provided drone id ({drone_id}) could not be found")]
pub struct DroneNotFound {
    pub drone_id: DroneId,
}

/// Errors from editing a drone's path by index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WaypointError {
    #[error(transparent)]
    DroneNotFound(#[from] DroneNotFound),

    /// The index was past the end of the path. Indices shift after every removal, so a stale
    /// index is the usual cause.
    #[error("waypoint index {index} is out of range for drone {drone_id} ({len} waypoints)")]
    IndexOutOfRange {
        drone_id: DroneId,
        index: usize,
        len: usize,
    },
}
