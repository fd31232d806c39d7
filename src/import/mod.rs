//! Normalization of externally supplied fleet documents.
//!
//! Two shapes are accepted:
//!
//! - an array of drone objects, each carrying its own `id` and `name`:
//!   `[{"id": "d1", "name": "Scout", "waypoints": [...]}]`
//! - an object keyed by drone id, each value carrying at least a `name`:
//!   `{"d1": {"name": "Scout", "waypoints": [...]}}`
//!
//! Missing or non-array `waypoints` default to an empty path. Drones without a usable id or name,
//! and waypoints without valid coordinates, are dropped one by one while the rest of the document
//! is kept. The persisted fleet slot is read through the same rules.

pub mod error;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::drone::{Drone, DroneId};
use crate::fleet::Fleet;
use crate::geo::Waypoint;

pub use self::error::ImportError;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Parse an uploaded file into a fleet.
///
/// A declared `content_type` must be `application/json`; when none is declared the file name
/// must end in `.json`.
pub fn parse_document(
    content_type: Option<&str>,
    file_name: &str,
    bytes: &[u8],
) -> Result<Fleet, ImportError> {
    let is_json = match content_type {
        Some(content_type) => content_type
            .split(';')
            .next()
            .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE)),
        None => file_name.to_ascii_lowercase().ends_with(".json"),
    };

    if !is_json {
        return Err(ImportError::NotJson {
            content_type: content_type.unwrap_or(file_name).to_owned(),
        });
    }

    let value: Value = serde_json::from_slice(bytes)?;
    normalize(&value)
}

/// Rebuild a canonical [`Fleet`] from an arbitrary JSON value.
pub fn normalize(value: &Value) -> Result<Fleet, ImportError> {
    let fleet = match value {
        Value::Array(entries) => normalize_array(entries)?,
        Value::Object(entries) => normalize_keyed(entries),
        other => {
            return Err(ImportError::UnsupportedShape {
                found: kind(other),
            });
        }
    };

    info!(drones = fleet.len(), "Normalized fleet document");
    Ok(fleet)
}

fn normalize_array(entries: &[Value]) -> Result<Fleet, ImportError> {
    if let Some((index, element)) = entries.iter().enumerate().find(|(_, e)| !e.is_object()) {
        return Err(ImportError::MalformedElement {
            index,
            found: kind(element),
        });
    }

    let mut fleet = Fleet::new();
    for (index, entry) in entries.iter().enumerate() {
        let Some(fields) = entry.as_object() else {
            continue;
        };

        let Some(id) = fields.get("id").and_then(Value::as_str) else {
            debug!(index, "Dropping drone without a string id");
            continue;
        };

        if let Some(drone) = build_drone(id, fields) {
            fleet.upsert(drone);
        }
    }

    Ok(fleet)
}

fn normalize_keyed(entries: &Map<String, Value>) -> Fleet {
    let mut fleet = Fleet::new();
    for (id, entry) in entries {
        let Some(fields) = entry.as_object() else {
            debug!(drone_id = %id, "Dropping drone entry that is not an object");
            continue;
        };

        if let Some(drone) = build_drone(id, fields) {
            fleet.upsert(drone);
        }
    }

    fleet
}

fn build_drone(id: &str, fields: &Map<String, Value>) -> Option<Drone> {
    if id.trim().is_empty() {
        debug!("Dropping drone with a blank id");
        return None;
    }

    let Some(name) = fields.get("name").and_then(Value::as_str) else {
        debug!(drone_id = %id, "Dropping drone without a string name");
        return None;
    };

    let waypoints = match fields.get("waypoints") {
        Some(Value::Array(raw)) => raw
            .iter()
            .enumerate()
            .filter_map(|(index, raw)| {
                let waypoint = parse_waypoint(raw);
                if waypoint.is_none() {
                    debug!(drone_id = %id, index, "Dropping malformed waypoint");
                }
                waypoint
            })
            .collect(),
        _ => Vec::new(),
    };

    match Drone::with_waypoints(DroneId::from(id), name, waypoints) {
        Ok(drone) => Some(drone),
        Err(e) => {
            debug!(drone_id = %id, error = %e, "Dropping drone");
            None
        }
    }
}

fn parse_waypoint(raw: &Value) -> Option<Waypoint> {
    let fields = raw.as_object()?;
    let lat = fields.get("lat")?.as_f64()?;
    let lng = fields.get("lng")?.as_f64()?;
    let altitude = fields.get("altitude").and_then(Value::as_f64);

    Waypoint::new(lat, lng, altitude).ok()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The keyed-object form of `fleet`, readable again by [`normalize`].
pub fn export(fleet: &Fleet) -> Result<Value, serde_json::Error> {
    serde_json::to_value(fleet)
}

/// Pretty-printed JSON of [`export`], suitable for writing to a file.
pub fn export_string(fleet: &Fleet) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(fleet)
}
