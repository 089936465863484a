use std::path::PathBuf;

use clap::Parser;

use crate::error::{CleanerError, Result};

pub const DEFAULT_MAX_SPEED_KMH: f64 = 100.0;
pub const DEFAULT_INTERVAL_SECS: f64 = 30.0;

/// Remove implausible fixes from GPX tracks and optionally resample them
/// onto a fixed time grid.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Input GPX file, or a directory searched recursively for *.gpx
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Output GPX file, or output directory when the input is a directory
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Max speed (km/h) between a fix and the last kept fix
    #[arg(short = 's', long, default_value_t = DEFAULT_MAX_SPEED_KMH)]
    pub max_speed: f64,

    /// Resample the cleaned track onto a fixed time grid
    #[arg(long, default_value_t = false)]
    pub resample: bool,

    /// Grid interval in seconds (used with --resample)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval: f64,

    /// Write a per-segment CSV report
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Retry unparsable files after minimal XML repairs
    #[arg(long, default_value_t = false)]
    pub tolerant: bool,

    /// Verbose logging (DEBUG level)
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    pub fn settings(&self) -> Result<CleanerSettings> {
        let interval = self.resample.then_some(self.interval);
        CleanerSettings::new(self.max_speed, interval)
    }

    pub fn jobs(&self) -> usize {
        self.jobs.filter(|&n| n > 0).unwrap_or_else(num_cpus::get)
    }
}

/// Validated knobs for the cleaning pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanerSettings {
    pub max_speed_kmh: f64,
    /// `None` runs outlier removal alone
    pub interval_secs: Option<f64>,
}

impl CleanerSettings {
    pub fn new(max_speed_kmh: f64, interval_secs: Option<f64>) -> Result<Self> {
        ensure_positive("max_speed", max_speed_kmh)?;
        if let Some(interval) = interval_secs {
            ensure_positive("interval", interval)?;
        }
        Ok(CleanerSettings {
            max_speed_kmh,
            interval_secs,
        })
    }
}

impl Default for CleanerSettings {
    fn default() -> Self {
        CleanerSettings {
            max_speed_kmh: DEFAULT_MAX_SPEED_KMH,
            interval_secs: None,
        }
    }
}

fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CleanerError::InvalidSetting { name, value })
    }
}
