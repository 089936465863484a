//! Clean GPS track logs: drop fixes that imply an impossible ground speed,
//! then optionally resample what is left onto a fixed time grid.

pub mod batch;
pub mod config;
pub mod error;
pub mod gpx_io;
pub mod interval_resampler;
pub mod outlier_filter;
pub mod pipeline;
pub mod report;
pub mod speed;
pub mod track_point;

pub use config::{CleanerSettings, Config};
pub use error::{CleanerError, Result};
pub use track_point::TrackPoint;
