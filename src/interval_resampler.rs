//! Time-grid resampling by linear interpolation.
//!
//! Grid instants are `first.time + k * interval`. Walking the input pair by
//! pair, every grid instant strictly inside a pair is filled by
//! interpolating between the pair's ends, then the pair's closing fix is
//! passed through untouched. A grid instant that lands exactly on an input
//! fix is served by that fix, never recomputed.

use chrono::{DateTime, Duration, Utc};

use crate::error::{CleanerError, Result};
use crate::speed::seconds_between;
use crate::track_point::TrackPoint;

/// Lazily walks the input pairs and yields the resampled sequence
#[derive(Debug, Clone)]
pub struct Resampler<'a> {
    points: &'a [TrackPoint],
    step: Duration,
    next_grid: Option<DateTime<Utc>>,
    current: usize,
    emitted_first: bool,
}

impl<'a> Resampler<'a> {
    pub fn new(points: &'a [TrackPoint], interval_secs: f64) -> Result<Self> {
        let step = interval_to_duration(interval_secs)?;
        let next_grid = points.first().and_then(|p| p.time.checked_add_signed(step));

        Ok(Resampler {
            points,
            step,
            next_grid,
            current: 1,
            emitted_first: false,
        })
    }
}

impl Iterator for Resampler<'_> {
    type Item = TrackPoint;

    fn next(&mut self) -> Option<TrackPoint> {
        if !self.emitted_first {
            self.emitted_first = true;
            return self.points.first().cloned();
        }

        let points = self.points;
        let current = points.get(self.current)?;
        let previous = &points[self.current - 1];

        // The grid always sits past previous.time, so a hit here is strictly
        // inside the pair and the span is never zero
        if let Some(grid) = self.next_grid.filter(|g| *g < current.time) {
            self.next_grid = grid.checked_add_signed(self.step);
            let ratio = seconds_between(previous.time, grid) / seconds_between(previous.time, current.time);
            return Some(previous.interpolate(current, ratio, grid));
        }

        if self.next_grid == Some(current.time) {
            self.next_grid = current.time.checked_add_signed(self.step);
        }
        self.current += 1;
        Some(current.clone())
    }
}

/// Resample `points` onto a grid of `interval_secs`, starting at the first point
pub fn resample(points: &[TrackPoint], interval_secs: f64) -> Result<Vec<TrackPoint>> {
    Ok(Resampler::new(points, interval_secs)?.collect())
}

fn interval_to_duration(interval_secs: f64) -> Result<Duration> {
    let invalid = CleanerError::InvalidSetting {
        name: "interval",
        value: interval_secs,
    };
    if !interval_secs.is_finite() || interval_secs <= 0.0 {
        return Err(invalid);
    }

    let nanos = (interval_secs * 1e9).round();
    if nanos < 1.0 || nanos > i64::MAX as f64 {
        return Err(invalid);
    }
    Ok(Duration::nanoseconds(nanos as i64))
}
