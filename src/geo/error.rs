/// Indicates that a coordinate pair cannot describe a point on the globe.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate (lat {lat}, lng {lng}): {reason}")]
pub struct InvalidCoordinate {
    pub lat: f64,
    pub lng: f64,
    pub reason: &'static str,
}
