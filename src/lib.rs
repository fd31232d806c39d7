//! Fleet simulation state engine: drones with ordered waypoint paths, a fleet-wide play/pause
//! simulation, and the persistence and import contract for the fleet.

pub mod config;
pub mod drone;
pub mod engine;
pub mod fleet;
pub mod geo;
pub mod geocode;
pub mod import;
pub mod notice;
pub mod path;
pub mod persistence;
pub mod state_machine;
pub mod store;
pub mod view;

use persistence::{FileSlot, FleetPersistence};

pub use config::EngineConfig;
pub use drone::{Drone, DroneId};
pub use engine::FleetEngine;
pub use fleet::Fleet;
pub use geo::{Position, Waypoint};

/// Open the engine backed by the file slot described by `config`.
pub fn open_engine(config: &EngineConfig) -> FleetEngine<FileSlot> {
    let slot = FileSlot::new(&config.storage_dir);
    FleetEngine::new(
        FleetPersistence::new(slot, config.storage_key.clone()),
        config.flight_duration,
    )
}
