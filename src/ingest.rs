//! Ingestion: run metadata extraction and thumbnailing over uploaded photos.
//!
//! The two stages are independent pure functions over the same bytes, so
//! [`ingest_bytes`] runs them side by side with `rayon::join`. Extraction
//! cannot fail; thumbnailing can, and its error is the ingest error.
//!
//! ## Batch mode
//!
//! [`ingest_dir`] walks a directory, keeps files whose extension maps to a
//! supported [`Format`], and ingests them on the current rayon pool. Progress
//! is reported through an optional channel of [`IngestEvent`]s so the CLI can
//! print while workers run. A failed image is reported and skipped; it never
//! aborts the batch.
//!
//! ```text
//! uploads/
//! ├── 2023-lisbon/IMG_0042.JPG   → exif + thumbnail
//! ├── 2023-lisbon/map.png        → exif (usually empty) + thumbnail
//! └── notes.txt                  → ignored
//! ```

use crate::format::{Format, UnsupportedFormat};
use crate::imaging::{
    Dimensions, EncodeSettings, ImageCodec, ImagingError, ThumbnailBounds, ThumbnailResult,
    make_thumbnail,
};
use crate::metadata::{ExifMetadata, extract};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] ImagingError),
    #[error("Cannot infer image format from file name: {0}")]
    UnknownExtension(#[from] UnsupportedFormat),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Everything the pipeline derives from one photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestedImage {
    pub metadata: ExifMetadata,
    pub thumbnail: ThumbnailResult,
}

/// Encoder and bounding box applied to every image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSettings {
    pub bounds: ThumbnailBounds,
    pub encode: EncodeSettings,
}

/// Extract metadata and build a thumbnail concurrently.
pub fn ingest_bytes(
    codec: &impl ImageCodec,
    bytes: &[u8],
    format: Format,
    settings: &IngestSettings,
) -> Result<IngestedImage, ImagingError> {
    let (metadata, thumbnail) = rayon::join(
        || extract(bytes),
        || make_thumbnail(codec, bytes, format, &settings.bounds, &settings.encode),
    );
    Ok(IngestedImage {
        metadata,
        thumbnail: thumbnail?,
    })
}

/// One entry of the batch manifest.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    /// Path relative to the ingested directory.
    pub source_path: String,
    pub format: Format,
    /// Original dimensions.
    pub dimensions: Dimensions,
    #[serde(flatten)]
    pub image: IngestedImage,
}

/// A file the batch could not ingest.
#[derive(Debug, Clone, Serialize)]
pub struct FailedEntry {
    pub source_path: String,
    pub error: String,
}

/// Output of [`ingest_dir`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestManifest {
    pub images: Vec<ManifestEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedEntry>,
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum IngestEvent {
    Started {
        root: PathBuf,
        image_count: usize,
    },
    ImageIngested {
        index: usize,
        source_path: String,
        dimensions: Dimensions,
        thumbnail: Dimensions,
        thumbnail_bytes: usize,
        metadata: ExifMetadata,
    },
    ImageFailed {
        index: usize,
        source_path: String,
        error: String,
    },
}

/// Collect ingestible files under `root`, sorted by path.
pub fn discover_images(root: &Path) -> Result<Vec<(PathBuf, Format)>, IngestError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(format) = Format::from_extension(entry.path()) {
            found.push((entry.path().to_path_buf(), format));
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Read a file and infer its format from the extension.
pub fn read_image(path: &Path) -> Result<(Format, Vec<u8>), IngestError> {
    let format = Format::from_extension(path)?;
    let bytes = std::fs::read(path)?;
    Ok((format, bytes))
}

fn ingest_file(
    codec: &impl ImageCodec,
    path: &Path,
    format: Format,
    settings: &IngestSettings,
) -> Result<(Dimensions, IngestedImage), IngestError> {
    let bytes = std::fs::read(path)?;
    let image = ingest_bytes(codec, &bytes, format, settings)?;
    Ok((image.thumbnail.source, image))
}

/// Ingest every supported image under `root` in parallel.
///
/// Results keep discovery order regardless of which worker finishes first.
pub fn ingest_dir(
    codec: &impl ImageCodec,
    root: &Path,
    settings: &IngestSettings,
    events: Option<Sender<IngestEvent>>,
) -> Result<IngestManifest, IngestError> {
    let files = discover_images(root)?;
    tracing::info!(root = %root.display(), count = files.len(), "ingesting directory");

    if let Some(tx) = &events {
        tx.send(IngestEvent::Started {
            root: root.to_path_buf(),
            image_count: files.len(),
        })
        .ok();
    }

    let results: Vec<_> = files
        .par_iter()
        .enumerate()
        .map_with(events, |events, (index, (path, format))| {
            let source_path = relative_display(root, path);
            let result = ingest_file(codec, path, *format, settings);
            if let Some(tx) = events {
                let event = match &result {
                    Ok((dimensions, image)) => IngestEvent::ImageIngested {
                        index: index + 1,
                        source_path: source_path.clone(),
                        dimensions: *dimensions,
                        thumbnail: Dimensions {
                            width: image.thumbnail.width,
                            height: image.thumbnail.height,
                        },
                        thumbnail_bytes: image.thumbnail.bytes.len(),
                        metadata: image.metadata,
                    },
                    Err(e) => IngestEvent::ImageFailed {
                        index: index + 1,
                        source_path: source_path.clone(),
                        error: e.to_string(),
                    },
                };
                tx.send(event).ok();
            }
            (source_path, *format, result)
        })
        .collect();

    let mut manifest = IngestManifest::default();
    for (source_path, format, result) in results {
        match result {
            Ok((dimensions, image)) => manifest.images.push(ManifestEntry {
                source_path,
                format,
                dimensions,
                image,
            }),
            Err(e) => {
                tracing::warn!(path = %source_path, error = %e, "failed to ingest image");
                manifest.failed.push(FailedEntry {
                    source_path,
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(manifest)
}

/// Write the manifest as pretty JSON.
pub fn write_manifest(manifest: &IngestManifest, path: &Path) -> Result<(), IngestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustCodec;
    use crate::imaging::backend::tests::{MockCodec, RecordedOp};
    use crate::test_helpers::{gps_fields, jpeg_bytes, jpeg_with_exif, png_bytes};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn ingest_bytes_runs_both_stages() {
        let bytes = jpeg_with_exif(&gps_fields((48, 51, 30), "N", (2, 21, 0), "E"));
        let codec = MockCodec::with_grids(vec![MockCodec::grid(32, 24)]);

        let image = ingest_bytes(&codec, &bytes, Format::Jpeg, &IngestSettings::default()).unwrap();

        assert!(image.metadata.has_position());
        assert_eq!((image.thumbnail.width, image.thumbnail.height), (480, 360));
        assert!(
            codec
                .get_operations()
                .contains(&RecordedOp::Encode {
                    format: Format::Avif,
                    width: 480,
                    height: 360,
                    quality: 60,
                })
        );
    }

    #[test]
    fn ingest_bytes_fails_when_thumbnail_fails() {
        let codec = MockCodec::new();
        let result = ingest_bytes(&codec, b"", Format::Png, &IngestSettings::default());
        assert!(matches!(result, Err(ImagingError::Decode(_))));
    }

    #[test]
    fn ingest_bytes_with_real_codec_and_no_exif() {
        let image = ingest_bytes(
            &RustCodec::new(),
            &png_bytes(64, 36),
            Format::Png,
            &IngestSettings::default(),
        )
        .unwrap();
        assert_eq!(image.metadata, ExifMetadata::default());
        assert_eq!((image.thumbnail.width, image.thumbnail.height), (480, 270));
        assert!(image.thumbnail.data_url.starts_with("data:image/avif;base64,"));
    }

    fn setup_upload_dir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("lisbon")).unwrap();
        fs::write(tmp.path().join("lisbon/IMG_0001.JPG"), jpeg_bytes(40, 30)).unwrap();
        fs::write(tmp.path().join("lisbon/map.png"), png_bytes(20, 20)).unwrap();
        fs::write(tmp.path().join("notes.txt"), "not an image").unwrap();
        fs::write(tmp.path().join("broken.jpg"), b"truncated").unwrap();
        tmp
    }

    #[test]
    fn read_image_infers_format_from_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.PNG");
        fs::write(&path, png_bytes(4, 4)).unwrap();
        let (format, bytes) = read_image(&path).unwrap();
        assert_eq!(format, Format::Png);
        assert_eq!(bytes, png_bytes(4, 4));

        let err = read_image(&tmp.path().join("notes.txt")).unwrap_err();
        assert!(matches!(err, IngestError::UnknownExtension(_)));
    }

    #[test]
    fn discover_filters_by_extension_and_sorts() {
        let tmp = setup_upload_dir();
        let found = discover_images(tmp.path()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|(p, _)| relative_display(tmp.path(), p))
            .collect();
        assert_eq!(names, vec!["broken.jpg", "lisbon/IMG_0001.JPG", "lisbon/map.png"]);
        assert_eq!(found[1].1, Format::Jpeg);
        assert_eq!(found[2].1, Format::Png);
    }

    #[test]
    fn discover_orders_by_path_across_formats() {
        let tmp = TempDir::new().unwrap();
        for name in ["c.png", "a.avif", "b.jpg", "B.png"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }
        let found = discover_images(tmp.path()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|(p, _)| relative_display(tmp.path(), p))
            .collect();
        assert_eq!(names, vec!["B.png", "a.avif", "b.jpg", "c.png"]);
        assert_eq!(found[1].1, Format::Avif);
    }

    #[test]
    fn ingest_dir_reports_decoded_dimensions_without_identify() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("one.jpg"), b"jpeg").unwrap();
        let codec = MockCodec::with_grids(vec![MockCodec::grid(200, 100)]);

        let manifest = ingest_dir(&codec, tmp.path(), &IngestSettings::default(), None).unwrap();

        assert_eq!(manifest.images[0].dimensions, Dimensions { width: 200, height: 100 });
        let ops = codec.get_operations();
        assert!(!ops.iter().any(|op| matches!(op, RecordedOp::Identify(_))));
        assert_eq!(
            ops.iter()
                .filter(|op| matches!(op, RecordedOp::Decode { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn ingest_dir_collects_successes_and_failures() {
        let tmp = setup_upload_dir();
        let (tx, rx) = std::sync::mpsc::channel();

        let manifest = ingest_dir(
            &RustCodec::new(),
            tmp.path(),
            &IngestSettings::default(),
            Some(tx),
        )
        .unwrap();

        let ok: Vec<&str> = manifest
            .images
            .iter()
            .map(|e| e.source_path.as_str())
            .collect();
        assert_eq!(ok, vec!["lisbon/IMG_0001.JPG", "lisbon/map.png"]);
        assert_eq!(manifest.images[0].dimensions, Dimensions { width: 40, height: 30 });
        assert_eq!(manifest.failed.len(), 1);
        assert_eq!(manifest.failed[0].source_path, "broken.jpg");

        let events: Vec<IngestEvent> = rx.iter().collect();
        assert!(matches!(
            events[0],
            IngestEvent::Started { image_count: 3, .. }
        ));
        assert_eq!(events.len(), 4);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, IngestEvent::ImageFailed { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn write_manifest_creates_parent_dirs() {
        let tmp = setup_upload_dir();
        let manifest =
            ingest_dir(&RustCodec::new(), tmp.path(), &IngestSettings::default(), None).unwrap();
        let out = tmp.path().join("out/manifest.json");
        write_manifest(&manifest, &out).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        let first = &json["images"][0];
        assert_eq!(first["source_path"], "lisbon/IMG_0001.JPG");
        assert_eq!(first["format"], "jpeg");
        assert!(
            first["thumbnail"]["data_url"]
                .as_str()
                .unwrap()
                .starts_with("data:image/avif;base64,")
        );
        assert!(first["metadata"]["latitude"].is_null());
        assert!(first["metadata"].as_object().unwrap().contains_key("capture_time_millis"));
        assert_eq!(json["failed"][0]["source_path"], "broken.jpg");
    }
}
