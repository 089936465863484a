use std::fs;
use std::path::Path;

use csv::Writer;
use serde::Serialize;

use crate::error::{CleanerError, Result};
use crate::gpx_io::SegmentSummary;

/// One CSV row per cleaned segment
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SegmentReport {
    pub file: String,
    pub track: usize,
    pub segment: usize,
    pub input_points: usize,
    pub untimed_dropped: usize,
    pub outliers_removed: usize,
    pub filtered_points: usize,
    pub output_points: usize,
    pub synthetic_points: usize,
    pub distance_before_km: f64,
    pub distance_after_km: f64,
    pub duration_s: f64,
}

impl SegmentReport {
    pub fn from_summary(file: &str, summary: &SegmentSummary) -> Self {
        let stats = &summary.stats;
        SegmentReport {
            file: file.to_string(),
            track: summary.track,
            segment: summary.segment,
            input_points: stats.input_points + summary.untimed_dropped,
            untimed_dropped: summary.untimed_dropped,
            outliers_removed: stats.outliers_removed,
            filtered_points: stats.filtered_points,
            output_points: stats.output_points,
            synthetic_points: stats.synthetic_points,
            distance_before_km: round3(stats.distance_before_km),
            distance_after_km: round3(stats.distance_after_km),
            duration_s: round3(stats.duration_secs),
        }
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub fn write_report(rows: &[SegmentReport], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CleanerError::io(parent, e))?;
    }
    let mut wtr = Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| CleanerError::io(path, e))?;
    Ok(())
}

/// Totals printed at the end of a run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunTotals {
    pub files: usize,
    pub segments: usize,
    pub input_points: usize,
    pub untimed_dropped: usize,
    pub outliers_removed: usize,
    pub output_points: usize,
    pub synthetic_points: usize,
}

impl RunTotals {
    pub fn add_file(&mut self, rows: &[SegmentReport]) {
        self.files += 1;
        for row in rows {
            self.segments += 1;
            self.input_points += row.input_points;
            self.untimed_dropped += row.untimed_dropped;
            self.outliers_removed += row.outliers_removed;
            self.output_points += row.output_points;
            self.synthetic_points += row.synthetic_points;
        }
    }
}

pub fn print_summary(totals: &RunTotals, failed: usize) {
    println!("\n🧹 CLEANING SUMMARY");
    println!("===================");
    println!("Files cleaned: {}", totals.files);
    if failed > 0 {
        println!("❌ Files failed: {}", failed);
    }
    println!("Segments: {}", totals.segments);
    println!("Input points: {}", totals.input_points);
    println!("  • without timestamp: {}", totals.untimed_dropped);
    println!("  • outliers removed: {}", totals.outliers_removed);
    println!("Output points: {}", totals.output_points);
    if totals.synthetic_points > 0 {
        println!("  • interpolated: {}", totals.synthetic_points);
    }
}
