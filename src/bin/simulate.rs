use anyhow::{Context, Result, anyhow};
use fleet_sim::engine::FleetEngine;
use fleet_sim::path::path_length_m;
use fleet_sim::persistence::FileSlot;
use fleet_sim::state_machine::simulation::{SimulationOutput, format_flight_time};
use fleet_sim::{DroneId, EngineConfig, open_engine};
use tokio::time::interval;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = EngineConfig::from_env();
    let mut engine = open_engine(&config);

    info!(
        store = %config.storage_dir.display(),
        drones = engine.fleet().len(),
        "Fleet loaded"
    );

    if let Ok(import_path) = std::env::var("FLEET_IMPORT") {
        let bytes = std::fs::read(&import_path)
            .with_context(|| format!("failed to read import file {import_path}"))?;
        let count = engine.import_document(None, &import_path, &bytes)?;
        info!(path = %import_path, drones = count, "Imported fleet");
    }

    let drone_id = pick_drone(&engine)?;
    engine.select_drone(Some(drone_id.clone()))?;

    if let Some(speed) = std::env::var("SIM_SPEED").ok().and_then(|v| v.parse().ok()) {
        engine.set_simulation_speed(speed);
    }

    engine.toggle_simulation()?;
    let path_m = engine
        .fleet()
        .get(&drone_id)
        .map_or(0.0, |drone| path_length_m(drone.waypoints()));
    info!(
        drone_id = %drone_id,
        speed = engine.simulation().speed_multiplier,
        path_m,
        "Simulation started"
    );

    let mut ticker = interval(config.tick_interval);
    let mut last_logged_second = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine.tick_now();

                while let Some(output) = engine.poll_simulation() {
                    match output {
                        SimulationOutput::StateChanged(state) => {
                            debug!(progress = state.progress, "Simulation advanced");
                        }
                        SimulationOutput::Completed => {
                            log_position(&engine, &drone_id);
                            info!(drone_id = %drone_id, "Flight complete");
                            return Ok(());
                        }
                    }
                }

                let second = engine.flight_time().as_secs();
                if last_logged_second != Some(second) && second % 10 == 0 {
                    last_logged_second = Some(second);
                    log_position(&engine, &drone_id);
                }
            }

            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, pausing simulation");
                engine.toggle_simulation()?;
                return Ok(());
            }
        }
    }
}

/// The drone named by `FLEET_DRONE`, or else the first drone with a flyable path.
fn pick_drone(engine: &FleetEngine<FileSlot>) -> Result<DroneId> {
    if let Ok(id) = std::env::var("FLEET_DRONE") {
        let id = DroneId::from(id);
        return engine
            .fleet()
            .contains(&id)
            .then_some(id.clone())
            .ok_or_else(|| anyhow!("drone {id} is not in the fleet"));
    }

    engine
        .fleet()
        .iter()
        .find(|drone| drone.is_flyable())
        .map(|drone| drone.id().clone())
        .ok_or_else(|| anyhow!("no drone has at least 2 waypoints"))
}

fn log_position(engine: &FleetEngine<FileSlot>, drone_id: &DroneId) {
    if let Some(position) = engine.position_of(drone_id) {
        info!(
            flight_time = %format_flight_time(engine.flight_time()),
            lat = position.lat,
            lng = position.lng,
            alt = ?position.altitude,
            "Position"
        );
    }
}
