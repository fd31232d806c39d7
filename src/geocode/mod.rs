//! Place search used to pick waypoint coordinates and map centers.
//!
//! Searches follow a last-query-wins discipline: every new query supersedes the ones still in
//! flight, and their results are discarded when they arrive.

pub mod config;
pub mod error;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::geo::Position;

pub use self::config::GeocodeConfig;
pub use self::error::GeocodeError;

/// A single search result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    pub place_id: u64,
    pub display_name: String,
    pub lat: String,
    pub lon: String,
}

impl Place {
    /// Parse the textual coordinates of this place.
    pub fn coordinates(&self) -> Result<Position, GeocodeError> {
        let invalid = || GeocodeError::InvalidCoordinates {
            place_id: self.place_id,
            lat: self.lat.clone(),
            lon: self.lon.clone(),
        };

        let lat: f64 = self.lat.trim().parse().map_err(|_| invalid())?;
        let lng: f64 = self.lon.trim().parse().map_err(|_| invalid())?;
        Position::new(lat, lng).map_err(|_| invalid())
    }

    /// The leading part of the display name, e.g. `"Big Ben"` for
    /// `"Big Ben, Westminster, London"`.
    pub fn short_name(&self) -> &str {
        self.display_name
            .split(',')
            .next()
            .map(str::trim)
            .unwrap_or_default()
    }
}

/// Backend answering place queries.
pub trait PlaceSource {
    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Place>, GeocodeError>> + Send;
}

/// [`PlaceSource`] backed by a Nominatim compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct NominatimSource {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl NominatimSource {
    pub fn new(config: &GeocodeConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl PlaceSource for NominatimSource {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Place>, GeocodeError> {
        let limit = limit.to_string();
        let places = self
            .client
            .get(self.endpoint.clone())
            .query(&[("q", query), ("format", "json"), ("limit", limit.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Place>>()
            .await?;

        Ok(places)
    }
}

/// Outcome of a [`PlaceSearch::search`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<Place>),
    /// The query was too short to be sent.
    TooShort,
    /// A newer query was issued before this one resolved; its results were discarded.
    Superseded,
}

/// Debounced, last-query-wins search over a [`PlaceSource`].
#[derive(Debug)]
pub struct PlaceSearch<S> {
    source: S,
    config: GeocodeConfig,
    generation: AtomicU64,
}

impl<S: PlaceSource> PlaceSearch<S> {
    pub fn new(source: S, config: GeocodeConfig) -> Self {
        Self {
            source,
            config,
            generation: AtomicU64::new(0),
        }
    }

    /// Run a query, superseding every query issued before it.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, GeocodeError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = query.trim();

        if query.chars().count() < self.config.min_query_len {
            return Ok(SearchOutcome::TooShort);
        }

        if !self.config.debounce.is_zero() {
            tokio::time::sleep(self.config.debounce).await;
        }
        if self.is_stale(generation) {
            debug!(query, "Query superseded before it was sent");
            return Ok(SearchOutcome::Superseded);
        }

        let result = self.source.search(query, self.config.limit).await;
        if self.is_stale(generation) {
            debug!(query, "Discarding results of superseded query");
            return Ok(SearchOutcome::Superseded);
        }

        match result {
            Ok(places) => {
                debug!(query, results = places.len(), "Place search finished");
                Ok(SearchOutcome::Results(places))
            }
            Err(e) => {
                warn!(query, error = %e, "Place search failed");
                Err(e)
            }
        }
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;

    /// Answers every query with one place named after it, after a per-query delay.
    #[derive(Default)]
    struct FakeSource {
        calls: AtomicUsize,
    }

    impl PlaceSource for FakeSource {
        async fn search(&self, query: &str, _limit: usize) -> Result<Vec<Place>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = if query.starts_with("slow") { 80 } else { 0 };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            Ok(vec![Place {
                place_id: 1,
                display_name: format!("{query}, Somewhere"),
                lat: "51.5".to_owned(),
                lon: "-0.09".to_owned(),
            }])
        }
    }

    fn debounced(debounce_ms: u64) -> GeocodeConfig {
        GeocodeConfig::builder()
            .debounce(Duration::from_millis(debounce_ms))
            .build()
    }

    #[test]
    fn test_default_config() {
        let config = GeocodeConfig::default();
        assert_eq!(config.endpoint.as_str(), super::config::DEFAULT_ENDPOINT);
        assert_eq!(config.limit, 5);
        assert_eq!(config.min_query_len, 3);
        assert_eq!(config.debounce, Duration::from_millis(500));
    }

    #[test]
    fn test_place_coordinates() {
        let place = Place {
            place_id: 9,
            display_name: "Big Ben, Westminster, London".to_owned(),
            lat: " 51.5007 ".to_owned(),
            lon: "-0.1246".to_owned(),
        };

        let position = place.coordinates().unwrap();
        assert_eq!(position.lat, 51.5007);
        assert_eq!(position.lng, -0.1246);
        assert_eq!(place.short_name(), "Big Ben");
    }

    #[test]
    fn test_place_invalid_coordinates() {
        let place = Place {
            place_id: 9,
            display_name: "Nowhere".to_owned(),
            lat: "north".to_owned(),
            lon: "0".to_owned(),
        };
        assert!(matches!(
            place.coordinates(),
            Err(GeocodeError::InvalidCoordinates { place_id: 9, .. })
        ));
    }

    #[test]
    fn test_place_deserializes_from_nominatim_json() {
        let places: Vec<Place> = serde_json::from_str(
            r#"[{"place_id": 42, "display_name": "London, UK", "lat": "51.5", "lon": "-0.12",
                 "importance": 0.9}]"#,
        )
        .unwrap();
        assert_eq!(places[0].place_id, 42);
        assert_eq!(places[0].short_name(), "London");
    }

    #[tokio::test]
    async fn test_short_query_not_sent() {
        let search = PlaceSearch::new(FakeSource::default(), debounced(0));
        assert_eq!(search.search("  ab ").await.unwrap(), SearchOutcome::TooShort);
        assert_eq!(search.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_results_returned() {
        let search = PlaceSearch::new(FakeSource::default(), debounced(0));
        let SearchOutcome::Results(places) = search.search("London").await.unwrap() else {
            panic!("expected results");
        };
        assert_eq!(places[0].short_name(), "London");
    }

    #[tokio::test]
    async fn test_stale_results_discarded() {
        let search = PlaceSearch::new(FakeSource::default(), debounced(0));

        let (older, newer) = tokio::join!(search.search("slow query"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            search.search("fast query").await
        });

        assert_eq!(older.unwrap(), SearchOutcome::Superseded);
        assert!(matches!(newer.unwrap(), SearchOutcome::Results(_)));
    }

    #[tokio::test]
    async fn test_debounce_skips_superseded_requests() {
        let search = PlaceSearch::new(FakeSource::default(), debounced(60));

        let (first, second) = tokio::join!(search.search("Lond"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            search.search("London").await
        });

        assert_eq!(first.unwrap(), SearchOutcome::Superseded);
        assert!(matches!(second.unwrap(), SearchOutcome::Results(_)));
        assert_eq!(search.source.calls.load(Ordering::SeqCst), 1);
    }
}
