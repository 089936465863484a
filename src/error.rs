use std::path::PathBuf;

use gpx::errors::GpxError;

pub type Result<T> = std::result::Result<T, CleanerError>;

/// Everything that can go wrong while cleaning a GPX document
#[derive(Debug, thiserror::Error)]
pub enum CleanerError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse GPX {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: GpxError,
    },

    #[error("failed to write GPX {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: GpxError,
    },

    #[error("cannot scan input directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("report error: {0}")]
    Report(#[from] csv::Error),

    #[error("invalid setting {name} = {value} (must be a positive, finite number)")]
    InvalidSetting { name: &'static str, value: f64 },

    #[error("output {path} would overwrite the input")]
    OutputIsInput { path: PathBuf },

    #[error("no tracks found in {path}")]
    NoTracks { path: PathBuf },

    #[error("timestamp out of range: {0}")]
    Timestamp(String),

    #[error("worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{failed} of {total} files could not be cleaned")]
    BatchFailed { failed: usize, total: usize },
}

impl CleanerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CleanerError::Io {
            path: path.into(),
            source,
        }
    }
}
