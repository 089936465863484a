//! GPX boundary: reading (optionally tolerant of damaged exports),
//! conversion between `gpx::Waypoint` and `TrackPoint`, and writing.
//!
//! Points that survive cleaning unchanged are written back as their original
//! waypoint, so names, hdop, links and friends are kept. Interpolated points
//! only carry position, elevation and time.

use std::fs::{self, File};
use std::io::{BufWriter, Cursor};
use std::path::Path;

use chrono::{DateTime, Utc};
use geo::point;
use gpx::{Gpx, GpxVersion, Time, TrackSegment, Waypoint};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::config::CleanerSettings;
use crate::error::{CleanerError, Result};
use crate::pipeline::{clean_segments, SegmentStats};
use crate::track_point::TrackPoint;

/// Outcome for one segment of a cleaned document
#[derive(Debug, Clone)]
pub struct SegmentSummary {
    pub track: usize,
    pub segment: usize,
    pub untimed_dropped: usize,
    pub stats: SegmentStats,
}

#[derive(Debug)]
pub struct ExtractedSegment {
    pub points: Vec<TrackPoint>,
    pub untimed: usize,
}

pub fn read_gpx(path: &Path, tolerant: bool) -> Result<Gpx> {
    let content = fs::read_to_string(path).map_err(|e| CleanerError::io(path, e))?;
    parse_gpx_str(&content, tolerant).map_err(|source| CleanerError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Standard parse first; if that fails and `tolerant` is set, one retry on
/// a minimally repaired copy.
pub fn parse_gpx_str(content: &str, tolerant: bool) -> std::result::Result<Gpx, gpx::errors::GpxError> {
    match gpx::read(Cursor::new(content.as_bytes())) {
        Ok(gpx) => Ok(gpx),
        Err(e) if tolerant => {
            warn!("standard parsing failed ({}), retrying with minimal repairs", e);
            let repaired = apply_minimal_safe_repairs(content);
            gpx::read(Cursor::new(repaired.as_bytes()))
        }
        Err(e) => Err(e),
    }
}

pub fn write_gpx(gpx: &Gpx, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CleanerError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| CleanerError::io(path, e))?;
    gpx::write(gpx, BufWriter::new(file)).map_err(|source| CleanerError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Clean every segment of every track in place and report what happened
pub fn clean_document(gpx: &mut Gpx, settings: &CleanerSettings) -> Result<Vec<SegmentSummary>> {
    if gpx.version != GpxVersion::Gpx11 {
        debug!("writing {:?} document as GPX 1.1", gpx.version);
        gpx.version = GpxVersion::Gpx11;
    }

    let mut positions = Vec::new();
    let mut extracted = Vec::new();
    let mut untimed = Vec::new();
    for (track_idx, track) in gpx.tracks.iter().enumerate() {
        for (segment_idx, segment) in track.segments.iter().enumerate() {
            let segment_points = extract_points(segment)?;
            if segment_points.untimed > 0 {
                warn!(
                    "track {} segment {}: dropped {} points without a timestamp",
                    track_idx, segment_idx, segment_points.untimed
                );
            }
            if !is_time_ordered(&segment_points.points) {
                warn!(
                    "track {} segment {}: timestamps are not in order, results are unreliable",
                    track_idx, segment_idx
                );
            }
            positions.push((track_idx, segment_idx));
            untimed.push(segment_points.untimed);
            extracted.push(segment_points.points);
        }
    }

    let cleaned = clean_segments(&extracted, settings)?;

    let mut summaries = Vec::with_capacity(cleaned.len());
    for (((track_idx, segment_idx), result), untimed_dropped) in positions.into_iter().zip(cleaned).zip(untimed) {
        let segment = &mut gpx.tracks[track_idx].segments[segment_idx];
        *segment = rebuild_segment(&result.points, segment)?;
        summaries.push(SegmentSummary {
            track: track_idx,
            segment: segment_idx,
            untimed_dropped,
            stats: result.stats,
        });
    }

    debug!("cleaned {} segments", summaries.len());
    Ok(summaries)
}

pub fn extract_points(segment: &TrackSegment) -> Result<ExtractedSegment> {
    let mut points = Vec::with_capacity(segment.points.len());
    let mut untimed = 0;

    for (idx, waypoint) in segment.points.iter().enumerate() {
        let Some(time) = waypoint.time else {
            untimed += 1;
            continue;
        };
        let position = waypoint.point();
        points.push(TrackPoint {
            latitude: position.y(),
            longitude: position.x(),
            elevation: waypoint.elevation,
            time: to_utc(time)?,
            origin: Some(idx),
        });
    }

    Ok(ExtractedSegment { points, untimed })
}

/// Turn cleaned points back into a segment, reusing `source` waypoints for
/// every point that still knows where it came from
pub fn rebuild_segment(points: &[TrackPoint], source: &TrackSegment) -> Result<TrackSegment> {
    let mut rebuilt = TrackSegment::new();
    rebuilt.points.reserve(points.len());

    for p in points {
        let waypoint = match p.origin.and_then(|idx| source.points.get(idx)) {
            Some(original) => original.clone(),
            None => synthetic_waypoint(p)?,
        };
        rebuilt.points.push(waypoint);
    }

    Ok(rebuilt)
}

fn synthetic_waypoint(p: &TrackPoint) -> Result<Waypoint> {
    let mut waypoint = Waypoint::new(point!(x: p.longitude, y: p.latitude));
    waypoint.elevation = p.elevation;
    waypoint.time = Some(to_gpx_time(p.time)?);
    Ok(waypoint)
}

fn is_time_ordered(points: &[TrackPoint]) -> bool {
    points.windows(2).all(|w| w[0].time <= w[1].time)
}

pub fn to_utc(time: Time) -> Result<DateTime<Utc>> {
    let odt: OffsetDateTime = time.into();
    DateTime::from_timestamp(odt.unix_timestamp(), odt.nanosecond())
        .ok_or_else(|| CleanerError::Timestamp(format!("{} is outside the supported range", odt)))
}

pub fn to_gpx_time(time: DateTime<Utc>) -> Result<Time> {
    let nanos = i128::from(time.timestamp()) * 1_000_000_000 + i128::from(time.timestamp_subsec_nanos());
    let odt = OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(|e| CleanerError::Timestamp(e.to_string()))?;
    Ok(odt.into())
}

/// Repairs that never invent or alter track data: a missing XML declaration,
/// a truncated tail, and characters XML 1.0 forbids
fn apply_minimal_safe_repairs(content: &str) -> String {
    let mut repaired = remove_invalid_xml_chars(content);

    if !repaired.trim_start().starts_with("<?xml") {
        repaired = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", repaired);
    }

    close_truncated_document(&repaired)
}

fn close_truncated_document(content: &str) -> String {
    let mut repaired = content.trim_end().to_string();
    if repaired.ends_with("</gpx>") || !repaired.contains("<gpx") {
        return repaired;
    }

    // A half-written trailing point cannot be trusted
    if let Some(open) = repaired.rfind("<trkpt") {
        let closed = repaired.rfind("</trkpt>");
        if closed.map_or(true, |c| c < open) {
            repaired.truncate(open);
        }
    }

    let missing = |open: &str, close: &str, text: &str| text.matches(open).count().saturating_sub(text.matches(close).count());

    for _ in 0..missing("<trkseg>", "</trkseg>", &repaired) {
        repaired.push_str("\n    </trkseg>");
    }
    for _ in 0..missing("<trk>", "</trk>", &repaired) {
        repaired.push_str("\n  </trk>");
    }
    repaired.push_str("\n</gpx>\n");

    repaired
}

fn remove_invalid_xml_chars(content: &str) -> String {
    content
        .chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || ('\u{20}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}
