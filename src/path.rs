//! Position derivation along a piecewise-linear flight path.
//!
//! Progress is a fraction of the path's great-circle length. Within a segment, latitude, longitude
//! and altitude are interpolated linearly.

use crate::geo::{Position, Waypoint};
use crate::state_machine::simulation::clamp_progress;

/// Total great-circle length of the path in meters.
pub fn path_length_m(waypoints: &[Waypoint]) -> f64 {
    segment_lengths(waypoints).iter().sum()
}

/// The position reached after traversing `progress` of the path.
///
/// Returns `None` for an empty path. A single waypoint is its own position at every progress.
/// Progress `0.0` yields the first waypoint and `1.0` the last, exactly.
pub fn position_at(waypoints: &[Waypoint], progress: f64) -> Option<Position> {
    locate(waypoints, progress).map(|cursor| cursor.position)
}

/// The already-flown part of the path: every waypoint passed so far followed by the current
/// position.
pub fn traveled_path(waypoints: &[Waypoint], progress: f64) -> Vec<Position> {
    let Some(cursor) = locate(waypoints, progress) else {
        return Vec::new();
    };

    let mut traveled: Vec<Position> = waypoints[..=cursor.segment]
        .iter()
        .map(Waypoint::position)
        .collect();

    if traveled.last() != Some(&cursor.position) {
        traveled.push(cursor.position);
    }
    traveled
}

struct Cursor {
    /// Index of the waypoint that starts the segment holding the position.
    segment: usize,
    position: Position,
}

fn locate(waypoints: &[Waypoint], progress: f64) -> Option<Cursor> {
    let first = waypoints.first()?;
    if waypoints.len() == 1 {
        return Some(Cursor {
            segment: 0,
            position: first.position(),
        });
    }

    let progress = clamp_progress(progress);
    let last_segment = waypoints.len() - 2;

    if progress >= 1.0 {
        return Some(Cursor {
            segment: last_segment,
            position: waypoints[last_segment + 1].position(),
        });
    }

    let lengths = segment_lengths(waypoints);
    let total: f64 = lengths.iter().sum();

    // A path whose waypoints all coincide has no length to measure; weigh segments equally.
    let fractions: Vec<f64> = if total > 0.0 {
        lengths.iter().map(|len| len / total).collect()
    } else {
        vec![1.0 / lengths.len() as f64; lengths.len()]
    };

    let mut start = 0.0;
    for (segment, fraction) in fractions.iter().enumerate() {
        let end = start + fraction;
        if progress < end || segment == last_segment {
            let t = if *fraction > 0.0 {
                ((progress - start) / fraction).clamp(0.0, 1.0)
            } else {
                0.0
            };
            return Some(Cursor {
                segment,
                position: lerp(&waypoints[segment], &waypoints[segment + 1], t),
            });
        }
        start = end;
    }

    None
}

fn segment_lengths(waypoints: &[Waypoint]) -> Vec<f64> {
    waypoints
        .windows(2)
        .map(|pair| pair[0].position().distance_m(&pair[1].position()))
        .collect()
}

fn lerp(from: &Waypoint, to: &Waypoint, t: f64) -> Position {
    let mix = |a: f64, b: f64| a + (b - a) * t;

    if t <= 0.0 {
        return from.position();
    }

    Position {
        lat: mix(from.lat(), to.lat()),
        lng: mix(from.lng(), to.lng()),
        altitude: from
            .altitude()
            .zip(to.altitude())
            .map(|(a, b)| mix(a, b)),
    }
}
