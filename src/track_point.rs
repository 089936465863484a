use chrono::{DateTime, Utc};

/// One GPS fix as the cleaning stages see it.
///
/// `origin` is the index of the fix in the segment it was read from, so the
/// writer can restore every field of a pass-through point. Interpolated
/// points have no origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub time: DateTime<Utc>,
    pub origin: Option<usize>,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64, time: DateTime<Utc>) -> Self {
        TrackPoint {
            latitude,
            longitude,
            elevation: None,
            time,
            origin: None,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn with_origin(mut self, origin: usize) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Linear blend between `self` and `next` at `ratio` (0 = self, 1 = next),
    /// stamped with `time`. Elevation only survives when both ends carry one.
    pub fn interpolate(&self, next: &TrackPoint, ratio: f64, time: DateTime<Utc>) -> TrackPoint {
        let lerp = |a: f64, b: f64| a + (b - a) * ratio;

        TrackPoint {
            latitude: lerp(self.latitude, next.latitude),
            longitude: lerp(self.longitude, next.longitude),
            elevation: match (self.elevation, next.elevation) {
                (Some(a), Some(b)) => Some(lerp(a, b)),
                _ => None,
            },
            time,
            origin: None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.origin.is_none()
    }
}
