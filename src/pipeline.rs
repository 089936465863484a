//! Per-segment cleaning: outlier removal, then optional resampling.

use rayon::prelude::*;
use tracing::debug;

use crate::config::CleanerSettings;
use crate::error::Result;
use crate::interval_resampler::resample;
use crate::outlier_filter::remove_far_points;
use crate::speed::{path_length_km, seconds_between};
use crate::track_point::TrackPoint;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentStats {
    pub input_points: usize,
    pub outliers_removed: usize,
    pub filtered_points: usize,
    pub output_points: usize,
    pub synthetic_points: usize,
    pub distance_before_km: f64,
    pub distance_after_km: f64,
    pub duration_secs: f64,
}

#[derive(Debug, Clone)]
pub struct CleanedSegment {
    pub points: Vec<TrackPoint>,
    pub stats: SegmentStats,
}

pub fn clean_segment(points: &[TrackPoint], settings: &CleanerSettings) -> Result<CleanedSegment> {
    let filtered = remove_far_points(points, settings.max_speed_kmh);
    let filtered_points = filtered.len();

    let cleaned = match settings.interval_secs {
        Some(interval) => resample(&filtered, interval)?,
        None => filtered,
    };

    let duration_secs = match (points.first(), points.last()) {
        (Some(first), Some(last)) => seconds_between(first.time, last.time),
        _ => 0.0,
    };

    let stats = SegmentStats {
        input_points: points.len(),
        outliers_removed: points.len() - filtered_points,
        filtered_points,
        output_points: cleaned.len(),
        synthetic_points: cleaned.iter().filter(|p| p.is_synthetic()).count(),
        distance_before_km: path_length_km(points),
        distance_after_km: path_length_km(&cleaned),
        duration_secs,
    };

    debug!(
        "segment: {} in, {} outliers, {} out ({} synthetic), {:.2} km -> {:.2} km",
        stats.input_points,
        stats.outliers_removed,
        stats.output_points,
        stats.synthetic_points,
        stats.distance_before_km,
        stats.distance_after_km
    );

    Ok(CleanedSegment {
        points: cleaned,
        stats,
    })
}

/// Segments share nothing, so they are cleaned on the rayon pool.
/// Results come back in input order.
pub fn clean_segments(segments: &[Vec<TrackPoint>], settings: &CleanerSettings) -> Result<Vec<CleanedSegment>> {
    segments
        .par_iter()
        .map(|points| clean_segment(points, settings))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn fix(lat: f64, secs: i64, origin: usize) -> TrackPoint {
        TrackPoint::new(lat, 11.0, Utc.timestamp_opt(secs, 0).unwrap())
            .with_elevation(500.0)
            .with_origin(origin)
    }

    // ~11 m per 10 s with one teleport at index 3
    fn noisy_segment() -> Vec<TrackPoint> {
        let mut points: Vec<TrackPoint> = (0..7).map(|i| fix(48.0 + i as f64 * 0.0001, i as i64 * 10, i)).collect();
        points[3] = fix(48.5, 30, 3);
        points
    }

    #[test]
    fn test_filter_only() {
        let settings = CleanerSettings::new(100.0, None).unwrap();
        let cleaned = clean_segment(&noisy_segment(), &settings).unwrap();

        assert_eq!(cleaned.stats.input_points, 7);
        assert_eq!(cleaned.stats.outliers_removed, 1);
        assert_eq!(cleaned.stats.output_points, 6);
        assert_eq!(cleaned.stats.synthetic_points, 0);
        assert!(cleaned.stats.distance_after_km < cleaned.stats.distance_before_km);
        assert_eq!(cleaned.stats.duration_secs, 60.0);
        assert!(cleaned.points.iter().all(|p| p.origin != Some(3)));
    }

    #[test]
    fn test_filter_then_resample() {
        let settings = CleanerSettings::new(100.0, Some(15.0)).unwrap();
        let cleaned = clean_segment(&noisy_segment(), &settings).unwrap();

        let secs: Vec<i64> = cleaned.points.iter().map(|p| p.time.timestamp()).collect();
        // Kept fixes at 0, 10, 20, 40, 50, 60 s plus grid instants 15, 30, 45 s
        assert_eq!(secs, vec![0, 10, 15, 20, 30, 40, 45, 50, 60]);
        assert_eq!(cleaned.stats.filtered_points, 6);
        // 30 s was the teleport; it is rebuilt from the neighbours at 20 s and 40 s
        assert!(cleaned.points[4].is_synthetic());
        assert!((cleaned.points[4].latitude - 48.0003).abs() < 1e-9);
        assert_eq!(cleaned.stats.synthetic_points, 3);
        assert_eq!(cleaned.stats.output_points, 9);
    }

    #[test]
    fn test_single_point_survives_both_stages() {
        let settings = CleanerSettings::new(100.0, Some(30.0)).unwrap();
        let single = vec![fix(48.0, 0, 0)];
        let cleaned = clean_segment(&single, &settings).unwrap();
        assert_eq!(cleaned.points, single);
        assert_eq!(cleaned.stats.duration_secs, 0.0);
    }

    #[test]
    fn test_empty_segment() {
        let cleaned = clean_segment(&[], &CleanerSettings::default()).unwrap();
        assert!(cleaned.points.is_empty());
        assert_eq!(cleaned.stats, SegmentStats::default());
    }

    #[test]
    fn test_parallel_keeps_segment_order() {
        let settings = CleanerSettings::default();
        let segments: Vec<Vec<TrackPoint>> = (0..16).map(|n| noisy_segment()[..=(n % 7)].to_vec()).collect();
        let cleaned = clean_segments(&segments, &settings).unwrap();

        assert_eq!(cleaned.len(), 16);
        for (segment, result) in segments.iter().zip(&cleaned) {
            assert_eq!(result.stats.input_points, segment.len());
        }
    }
}
