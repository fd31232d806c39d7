use anyhow::{Result, bail};
use fleet_sim::geocode::{NominatimSource, PlaceSearch, SearchOutcome};
use fleet_sim::{DroneId, EngineConfig, open_engine};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Search for a place and, when `FLEET_DRONE` is set, append the best match to that drone's path.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if query.trim().is_empty() {
        bail!("usage: search <place name>");
    }

    let config = EngineConfig::from_env();
    let mut engine = open_engine(&config);
    let search = PlaceSearch::new(NominatimSource::new(&config.geocode)?, config.geocode.clone());

    info!(query = %query, endpoint = %config.geocode.endpoint, "Searching");

    let places = match search.search(&query).await {
        Ok(SearchOutcome::Results(places)) => places,
        Ok(SearchOutcome::TooShort) => bail!(
            "query must be at least {} characters",
            config.geocode.min_query_len
        ),
        Ok(SearchOutcome::Superseded) => return Ok(()),
        Err(e) => {
            engine.report_search_error(&e);
            return Err(e.into());
        }
    };

    for place in &places {
        println!("{:>12}  {}, {}  {}", place.place_id, place.lat, place.lon, place.display_name);
    }

    let Ok(drone_id) = std::env::var("FLEET_DRONE") else {
        return Ok(());
    };
    let Some(best) = places.first() else {
        bail!("no results for {query:?}");
    };

    engine.select_drone(Some(DroneId::from(drone_id.clone())))?;
    if let Some(index) = engine.add_waypoint_from_place(best)? {
        info!(drone_id = %drone_id, index, place = %best.short_name(), "Waypoint added");
    }

    Ok(())
}
