/// Errors from the place search collaborator.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// The HTTP request failed or returned an error status.
    #[error("place search request failed")]
    Request(#[from] reqwest::Error),

    /// The endpoint returned a result whose coordinates are not usable.
    #[error("place {place_id} has invalid coordinates ({lat}, {lon})")]
    InvalidCoordinates {
        place_id: u64,
        lat: String,
        lon: String,
    },
}
