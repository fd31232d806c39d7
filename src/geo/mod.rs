//! Geographic value types shared by the fleet model and the simulation.

pub mod error;

use serde::{Deserialize, Serialize};

pub use self::error::InvalidCoordinate;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A single stop on a drone's path.
///
/// Waypoints are validated on construction and immutable afterwards. Within a path they are
/// identified only by their index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWaypoint")]
pub struct Waypoint {
    lat: f64,
    lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    altitude: Option<f64>,
}

impl Waypoint {
    /// Create a waypoint, rejecting non-finite or out of range coordinates.
    pub fn new(lat: f64, lng: f64, altitude: Option<f64>) -> Result<Self, InvalidCoordinate> {
        validate(lat, lng)?;

        // A non-finite altitude carries no information; treat it like a missing one.
        let altitude = altitude.filter(|alt| alt.is_finite());

        Ok(Self { lat, lng, altitude })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    pub fn position(&self) -> Position {
        Position {
            lat: self.lat,
            lng: self.lng,
            altitude: self.altitude,
        }
    }
}

impl From<Waypoint> for Position {
    fn from(waypoint: Waypoint) -> Self {
        waypoint.position()
    }
}

#[derive(Deserialize)]
struct RawWaypoint {
    lat: f64,
    lng: f64,
    #[serde(default)]
    altitude: Option<f64>,
}

impl TryFrom<RawWaypoint> for Waypoint {
    type Error = InvalidCoordinate;

    fn try_from(raw: RawWaypoint) -> Result<Self, Self::Error> {
        Waypoint::new(raw.lat, raw.lng, raw.altitude)
    }
}

/// A location derived by the simulation or picked by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl Position {
    /// Create a position without altitude, validating the coordinate pair.
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidCoordinate> {
        validate(lat, lng)?;
        Ok(Self {
            lat,
            lng,
            altitude: None,
        })
    }

    /// Great-circle distance to `other` in meters, ignoring altitude.
    pub fn distance_m(&self, other: &Position) -> f64 {
        haversine_m(self.lat, self.lng, other.lat, other.lng)
    }
}

fn validate(lat: f64, lng: f64) -> Result<(), InvalidCoordinate> {
    let reason = if !lat.is_finite() || !lng.is_finite() {
        "coordinates must be finite"
    } else if !(-90.0..=90.0).contains(&lat) {
        "latitude must be within [-90, 90]"
    } else if !(-180.0..=180.0).contains(&lng) {
        "longitude must be within [-180, 180]"
    } else {
        return Ok(());
    };

    Err(InvalidCoordinate { lat, lng, reason })
}

/// Haversine distance in meters between two lat/lng pairs given in degrees.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}
