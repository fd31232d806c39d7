use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;
use tracing::warn;

use crate::geocode::GeocodeConfig;
use crate::persistence::DEFAULT_FLEET_KEY;
use crate::state_machine::simulation::DEFAULT_FLIGHT_DURATION;

/// Configuration for a [`FleetEngine`](crate::engine::FleetEngine) and the binaries driving it.
#[derive(Debug, Clone, Builder)]
pub struct EngineConfig {
    /// Directory holding the persisted fleet slot.
    #[builder(default = PathBuf::from(".fleet-sim"), into)]
    pub storage_dir: PathBuf,

    /// Name of the persisted fleet slot.
    #[builder(default = DEFAULT_FLEET_KEY.to_string(), into)]
    pub storage_key: String,

    /// Flight-clock length of a full traversal at 1x speed.
    #[builder(default = DEFAULT_FLIGHT_DURATION)]
    pub flight_duration: Duration,

    /// How often a driver advances the simulation.
    #[builder(default = Duration::from_millis(100))]
    pub tick_interval: Duration,

    #[builder(default)]
    pub geocode: GeocodeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EngineConfig {
    /// Build a configuration from environment variables, falling back to defaults:
    ///
    /// - `FLEET_STORE_DIR`: storage directory
    /// - `FLEET_STORE_KEY`: slot name
    /// - `FLEET_FLIGHT_SECS`: flight duration in seconds
    /// - `FLEET_TICK_MS`: tick interval in milliseconds
    /// - `GEOCODE_URL`: place search endpoint
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("FLEET_STORE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
        if let Ok(key) = std::env::var("FLEET_STORE_KEY") {
            config.storage_key = key;
        }
        if let Some(secs) = parse_env::<u64>("FLEET_FLIGHT_SECS") {
            config.flight_duration = Duration::from_secs(secs);
        }
        if let Some(millis) = parse_env::<u64>("FLEET_TICK_MS") {
            config.tick_interval = Duration::from_millis(millis.max(1));
        }
        if let Some(endpoint) = parse_env::<url::Url>("GEOCODE_URL") {
            config.geocode.endpoint = endpoint;
        }

        config
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparsable environment variable");
            None
        }
    }
}
