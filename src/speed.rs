//! Ground speed between fixes, on latitude/longitude only.
//!
//! Elevation in phone location exports is too unstable to feed into a speed
//! estimate, so nothing here reads it.

use chrono::{DateTime, Utc};
use geo::{point, HaversineDistance};

use crate::track_point::TrackPoint;

const MPS_TO_KMH: f64 = 3600.0 / 1000.0;

/// Haversine distance in metres between two fixes
pub fn distance_2d_m(a: &TrackPoint, b: &TrackPoint) -> f64 {
    let pa = point!(x: a.longitude, y: a.latitude);
    let pb = point!(x: b.longitude, y: b.latitude);
    pa.haversine_distance(&pb)
}

/// Signed seconds from `from` to `to`, keeping sub-second precision
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        // Only reachable for spans of ~292 years or more
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Metres per second. Coincident timestamps give infinity so any finite
/// threshold rejects the pair.
pub fn speed_mps(a: &TrackPoint, b: &TrackPoint) -> f64 {
    let elapsed = seconds_between(a.time, b.time).abs();
    if elapsed == 0.0 {
        return f64::INFINITY;
    }
    distance_2d_m(a, b) / elapsed
}

pub fn speed_kmh(a: &TrackPoint, b: &TrackPoint) -> f64 {
    speed_mps(a, b) * MPS_TO_KMH
}

/// Total 2D length of a point sequence in kilometres
pub fn path_length_km(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| distance_2d_m(&w[0], &w[1]))
        .sum::<f64>()
        / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fix(lat: f64, lon: f64, secs: i64) -> TrackPoint {
        TrackPoint::new(lat, lon, Utc.timestamp_opt(secs, 0).unwrap())
    }

    #[test]
    fn test_zero_time_delta_is_infinitely_fast() {
        let a = fix(52.0, 13.0, 100);
        let b = fix(52.0, 13.0, 100);
        assert!(speed_mps(&a, &b).is_infinite());
        assert!(speed_kmh(&a, &b).is_infinite());
    }

    #[test]
    fn test_speed_ignores_order_and_elevation() {
        let a = fix(52.0, 13.0, 0).with_elevation(0.0);
        let b = fix(52.001, 13.0, 10).with_elevation(5000.0);
        let flat_b = fix(52.001, 13.0, 10);

        let forward = speed_kmh(&a, &b);
        assert!((forward - speed_kmh(&b, &a)).abs() < 1e-9);
        assert!((forward - speed_kmh(&a, &flat_b)).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // ~111.2 km per degree on the mean-radius sphere
        let a = fix(0.0, 0.0, 0);
        let b = fix(1.0, 0.0, 3600);
        let kmh = speed_kmh(&a, &b);
        assert!(kmh > 111.0 && kmh < 111.4, "got {}", kmh);
    }

    #[test]
    fn test_sub_second_resolution() {
        let a = fix(0.0, 0.0, 0);
        let b = TrackPoint::new(0.0, 0.0, Utc.timestamp_opt(0, 500_000_000).unwrap());
        assert!((seconds_between(a.time, b.time) - 0.5).abs() < 1e-12);
        assert_eq!(speed_mps(&a, &b), 0.0);
    }
}
