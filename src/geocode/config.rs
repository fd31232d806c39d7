use std::time::Duration;

use bon::Builder;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

/// Configuration for place search.
#[derive(Debug, Clone, Builder)]
pub struct GeocodeConfig {
    /// Search endpoint, queried with `q`, `format` and `limit` parameters.
    #[builder(default = default_endpoint())]
    pub endpoint: Url,

    /// Maximum number of results requested per query.
    #[builder(default = 5)]
    pub limit: usize,

    /// Queries shorter than this (after trimming) are not sent.
    #[builder(default = 3)]
    pub min_query_len: usize,

    /// Quiet period after a query before it is sent; a newer query within it replaces the old one.
    #[builder(default = Duration::from_millis(500))]
    pub debounce: Duration,

    /// Sent as the `User-Agent` header, which public Nominatim instances require.
    #[builder(default = concat!("fleet-sim/", env!("CARGO_PKG_VERSION")).to_string())]
    pub user_agent: String,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_endpoint() -> Url {
    Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL")
}
