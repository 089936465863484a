//! Speed-gate outlier rejection.
//!
//! Each fix is judged against the last fix that survived, never against a
//! rejected one, so a burst of bad fixes is measured from the last good
//! position until the track comes back within reach.

use tracing::trace;

use crate::speed::speed_kmh;
use crate::track_point::TrackPoint;

/// Drop every point that is reached from the last retained point faster than
/// `max_speed_kmh`. The first point is always kept. A speed exactly at the
/// limit is kept.
pub fn remove_far_points(points: &[TrackPoint], max_speed_kmh: f64) -> Vec<TrackPoint> {
    let Some((first, rest)) = points.split_first() else {
        return Vec::new();
    };

    let mut retained = Vec::with_capacity(points.len());
    retained.push(first.clone());
    let mut last_kept = first;

    for point in rest {
        let speed = speed_kmh(last_kept, point);
        if speed > max_speed_kmh {
            trace!(
                "rejecting fix at {} ({:.1} km/h from last kept fix)",
                point.time,
                speed
            );
            continue;
        }
        retained.push(point.clone());
        last_kept = point;
    }

    retained
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn fix(lat: f64, lon: f64, secs: i64, origin: usize) -> TrackPoint {
        TrackPoint::new(lat, lon, Utc.timestamp_opt(secs, 0).unwrap()).with_origin(origin)
    }

    fn origins(points: &[TrackPoint]) -> Vec<usize> {
        points.iter().filter_map(|p| p.origin).collect()
    }

    // Walking pace: ~11 m every 10 s
    fn calm_track() -> Vec<TrackPoint> {
        (0..6)
            .map(|i| fix(48.0 + i as f64 * 0.0001, 11.0, i as i64 * 10, i))
            .collect()
    }

    #[test]
    fn test_no_op_when_everything_is_slow_enough() {
        let track = calm_track();
        assert_eq!(remove_far_points(&track, 100.0), track);
    }

    #[test]
    fn test_empty_and_single_point_unchanged() {
        assert!(remove_far_points(&[], 100.0).is_empty());

        let single = vec![fix(1.0, 2.0, 0, 0)];
        assert_eq!(remove_far_points(&single, 0.001), single);
    }

    #[test]
    fn test_first_point_is_never_removed() {
        // First fix is the glitch, but it has no predecessor to be judged by
        let track = vec![
            fix(10.0, 10.0, 0, 0),
            fix(48.0, 11.0, 10, 1),
            fix(48.0001, 11.0, 20, 2),
        ];
        let cleaned = remove_far_points(&track, 100.0);
        assert_eq!(origins(&cleaned), vec![0]);
    }

    #[test]
    fn test_consecutive_outliers_judged_against_last_kept_point() {
        // P1 jumps ~1.1 km in 1 s. P2 is ~11 m from P1 but still ~1.1 km from P0.
        let track = vec![
            fix(0.0, 0.0, 0, 0),
            fix(0.01, 0.0, 1, 1),
            fix(0.0101, 0.0, 2, 2),
        ];
        let cleaned = remove_far_points(&track, 100.0);
        assert_eq!(origins(&cleaned), vec![0]);
    }

    #[test]
    fn test_track_recovers_after_spike() {
        let mut track = calm_track();
        track[2] = fix(49.0, 11.0, 20, 2);
        let cleaned = remove_far_points(&track, 100.0);
        assert_eq!(origins(&cleaned), vec![0, 1, 3, 4, 5]);
    }

    #[test]
    fn test_output_is_ordered_subsequence() {
        let mut track = calm_track();
        track[1] = fix(60.0, 11.0, 10, 1);
        track[4] = fix(40.0, 11.0, 40, 4);
        let cleaned = remove_far_points(&track, 100.0);

        assert!(cleaned.len() <= track.len());
        assert_eq!(cleaned[0], track[0]);
        let kept = origins(&cleaned);
        assert!(kept.windows(2).all(|w| w[0] < w[1]));
        for p in &cleaned {
            assert_eq!(p, &track[p.origin.unwrap()]);
        }
    }

    #[test]
    fn test_duplicate_timestamp_is_rejected() {
        let track = vec![fix(0.0, 0.0, 0, 0), fix(0.0, 0.0, 0, 1), fix(0.0, 0.0001, 10, 2)];
        let cleaned = remove_far_points(&track, 100.0);
        assert_eq!(origins(&cleaned), vec![0, 2]);
    }

    #[test]
    fn test_limit_is_inclusive() {
        let track = vec![fix(0.0, 0.0, 0, 0), fix(0.0005, 0.0, 2, 1)];
        let exact = speed_kmh(&track[0], &track[1]);

        assert_eq!(remove_far_points(&track, exact).len(), 2);
        assert_eq!(remove_far_points(&track, exact - 1e-9).len(), 1);
    }
}
