//! Drives a whole run: one file, or every GPX file below a directory.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{error, info};
use walkdir::WalkDir;

use crate::config::{CleanerSettings, Config};
use crate::error::{CleanerError, Result};
use crate::gpx_io::{clean_document, read_gpx, write_gpx};
use crate::report::{print_summary, write_report, RunTotals, SegmentReport};

#[derive(Debug, Clone, PartialEq)]
pub struct FileJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

pub fn run(config: &Config) -> Result<RunTotals> {
    let settings = config.settings()?;
    let jobs = plan_jobs(&config.input, &config.output)?;
    info!(
        "cleaning {} file(s) with max speed {} km/h{}",
        jobs.len(),
        settings.max_speed_kmh,
        settings
            .interval_secs
            .map(|s| format!(", resampling every {} s", s))
            .unwrap_or_default()
    );

    let pool = rayon::ThreadPoolBuilder::new().num_threads(config.jobs()).build()?;
    let outcomes: Vec<Result<Vec<SegmentReport>>> = pool.install(|| {
        jobs.par_iter()
            .map(|job| clean_file(job, &settings, config.tolerant))
            .collect()
    });

    let mut totals = RunTotals::default();
    let mut rows = Vec::new();
    let mut failed = 0;
    for (job, outcome) in jobs.iter().zip(outcomes) {
        match outcome {
            Ok(file_rows) => {
                totals.add_file(&file_rows);
                rows.extend(file_rows);
            }
            Err(e) => {
                error!("{}: {}", job.input.display(), e);
                failed += 1;
            }
        }
    }

    if let Some(report_path) = &config.report {
        write_report(&rows, report_path)?;
        info!("report written to {}", report_path.display());
    }

    print_summary(&totals, failed);

    if failed > 0 {
        return Err(CleanerError::BatchFailed {
            failed,
            total: jobs.len(),
        });
    }
    Ok(totals)
}

/// A directory input maps every GPX file below it to the same relative path
/// under `output`. A file input writes to `output`, or into it when `output`
/// is an existing directory.
///
/// An output that resolves to the input itself is refused, since cleaning
/// would overwrite the source track.
pub fn plan_jobs(input: &Path, output: &Path) -> Result<Vec<FileJob>> {
    if !input.is_dir() {
        let output = if output.is_dir() {
            output.join(input.file_name().unwrap_or(input.as_os_str()))
        } else {
            output.to_path_buf()
        };
        if same_path(input, &output) {
            return Err(CleanerError::OutputIsInput { path: output });
        }
        return Ok(vec![FileJob {
            input: input.to_path_buf(),
            output,
        }]);
    }

    if same_path(input, output) {
        return Err(CleanerError::OutputIsInput {
            path: output.to_path_buf(),
        });
    }

    Ok(collect_gpx_files(input)?
        .into_iter()
        .map(|path| {
            let relative = path.strip_prefix(input).unwrap_or(&path).to_path_buf();
            FileJob {
                output: output.join(relative),
                input: path,
            }
        })
        .collect())
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

pub fn collect_gpx_files(input_folder: &Path) -> Result<Vec<PathBuf>> {
    let mut gpx_files = Vec::new();

    for entry in WalkDir::new(input_folder) {
        let entry = entry?;
        if entry.file_type().is_file() && has_gpx_extension(entry.path()) {
            gpx_files.push(entry.path().to_path_buf());
        }
    }

    gpx_files.sort();
    Ok(gpx_files)
}

fn has_gpx_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("gpx"))
}

pub fn clean_file(job: &FileJob, settings: &CleanerSettings, tolerant: bool) -> Result<Vec<SegmentReport>> {
    let mut gpx = read_gpx(&job.input, tolerant)?;
    if gpx.tracks.is_empty() {
        return Err(CleanerError::NoTracks {
            path: job.input.clone(),
        });
    }

    let summaries = clean_document(&mut gpx, settings)?;
    write_gpx(&gpx, &job.output)?;

    let name = job
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| job.input.display().to_string());
    let rows: Vec<SegmentReport> = summaries.iter().map(|s| SegmentReport::from_summary(&name, s)).collect();

    let removed: usize = rows.iter().map(|r| r.outliers_removed).sum();
    let written: usize = rows.iter().map(|r| r.output_points).sum();
    info!(
        "{}: {} outliers removed, {} points written to {}",
        name,
        removed,
        written,
        job.output.display()
    );

    Ok(rows)
}
