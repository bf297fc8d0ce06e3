//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Each image leads with its positional index and file name. The source path
//! and derived facts (dimensions, thumbnail size, position, capture time)
//! follow as indented context lines, so the output reads as an inventory of
//! what the pipeline learned about each photo.
//!
//! # Output Format
//!
//! ## Ingest
//!
//! ```text
//! Ingesting uploads/ (3 photos)
//!     001 IMG_0042.JPG
//!         Source: lisbon/IMG_0042.JPG
//!         Size: 4032x3024 → thumbnail 480x360 (18.2 KB)
//!         Position: 38.71069, -9.13975
//!         Captured: 2023-07-04 10:15:30 UTC
//!     002 map.png
//!         Source: lisbon/map.png
//!         Size: 1200x800 → thumbnail 480x320 (9.6 KB)
//!     003 broken.jpg
//!         Source: broken.jpg
//!         Failed: Image decode failed: ...
//!
//! Ingested 2 photos, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure, with no I/O.

use crate::imaging::Dimensions;
use crate::ingest::{IngestEvent, IngestManifest};
use crate::metadata::ExifMetadata;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(source_path: &str) -> String {
    Path::new(source_path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_path.to_string())
}

/// Human-readable byte count.
fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_dimensions(d: Dimensions) -> String {
    format!("{}x{}", d.width, d.height)
}

/// Render epoch milliseconds back to the EXIF wall-clock form.
fn format_capture_time(millis: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(millis) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("{} ms", millis),
    }
}

/// Indented `Position:` / `Captured:` lines for whatever metadata is present.
fn metadata_lines(metadata: &ExifMetadata, depth: usize) -> Vec<String> {
    let pad = indent(depth);
    let mut lines = Vec::new();
    if let (Some(lat), Some(lon)) = (metadata.latitude, metadata.longitude) {
        lines.push(format!("{}Position: {:.5}, {:.5}", pad, lat, lon));
    }
    if let Some(millis) = metadata.capture_time_millis {
        lines.push(format!("{}Captured: {}", pad, format_capture_time(millis)));
    }
    lines
}

// ============================================================================
// Ingest output
// ============================================================================

/// Format a single ingest progress event as display lines.
pub fn format_ingest_event(event: &IngestEvent) -> Vec<String> {
    match event {
        IngestEvent::Started { root, image_count } => {
            vec![format!(
                "Ingesting {} ({} photos)",
                root.display(),
                image_count
            )]
        }
        IngestEvent::ImageIngested {
            index,
            source_path,
            dimensions,
            thumbnail,
            thumbnail_bytes,
            metadata,
        } => {
            let mut lines = vec![
                format!(
                    "{}{} {}",
                    indent(1),
                    format_index(*index),
                    file_name(source_path)
                ),
                format!("{}Source: {}", indent(2), source_path),
                format!(
                    "{}Size: {} → thumbnail {} ({})",
                    indent(2),
                    format_dimensions(*dimensions),
                    format_dimensions(*thumbnail),
                    format_size(*thumbnail_bytes)
                ),
            ];
            lines.extend(metadata_lines(metadata, 2));
            lines
        }
        IngestEvent::ImageFailed {
            index,
            source_path,
            error,
        } => vec![
            format!(
                "{}{} {}",
                indent(1),
                format_index(*index),
                file_name(source_path)
            ),
            format!("{}Source: {}", indent(2), source_path),
            format!("{}Failed: {}", indent(2), error),
        ],
    }
}

/// Closing summary line for a batch.
pub fn format_ingest_summary(manifest: &IngestManifest) -> Vec<String> {
    let ok = manifest.images.len();
    let failed = manifest.failed.len();
    let noun = if ok == 1 { "photo" } else { "photos" };
    if failed == 0 {
        vec![String::new(), format!("Ingested {} {}", ok, noun)]
    } else {
        vec![
            String::new(),
            format!("Ingested {} {}, {} failed", ok, noun, failed),
        ]
    }
}

pub fn print_ingest_summary(manifest: &IngestManifest) {
    for line in format_ingest_summary(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Thumbnail and convert commands
// ============================================================================

/// Format the result of writing a converted or thumbnailed file.
pub fn format_written(source: &Path, target: &Path, dimensions: Dimensions, bytes: usize) -> String {
    format!(
        "{} → {} ({}, {})",
        source.display(),
        target.display(),
        format_dimensions(dimensions),
        format_size(bytes)
    )
}
