//! High-level image operations.
//!
//! These functions combine calculations with codec execution. They take
//! settings, compute dimensions, and call the codec. All of them are
//! synchronous and CPU-bound; run them on a worker pool, not on a thread that
//! must stay responsive.

use super::backend::{Dimensions, ImageCodec, ImagingError, PixelGrid};
use super::calculations::calculate_contain_dimensions;
use super::data_url::to_data_url;
use super::params::{EncodeSettings, ThumbnailBounds};
use crate::format::Format;
use image::imageops::FilterType;
use std::time::Instant;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImagingError>;

/// Format every thumbnail is encoded to.
pub const THUMBNAIL_FORMAT: Format = Format::Avif;

/// An encoded thumbnail and its inline text form.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ThumbnailResult {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// `data:image/avif;base64,...`
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    /// Dimensions of the decoded source image.
    #[serde(skip)]
    pub source: Dimensions,
}

/// Get image dimensions from the container header.
pub fn get_dimensions(codec: &impl ImageCodec, format: Format, bytes: &[u8]) -> Result<Dimensions> {
    codec.identify(format, bytes)
}

/// Decode a buffer, treating a grid with no pixels as a decode failure.
pub fn decode(codec: &impl ImageCodec, format: Format, bytes: &[u8]) -> Result<PixelGrid> {
    let started = Instant::now();
    let grid = codec.decode(format, bytes)?;
    if grid.is_empty() {
        return Err(ImagingError::Decode(format!(
            "{format} decoder produced no pixel data"
        )));
    }
    tracing::debug!(
        %format,
        width = grid.width(),
        height = grid.height(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "decoded image"
    );
    Ok(grid)
}

/// Encode a grid with fixed settings.
pub fn encode(
    codec: &impl ImageCodec,
    format: Format,
    grid: &PixelGrid,
    settings: &EncodeSettings,
) -> Result<Vec<u8>> {
    let started = Instant::now();
    let bytes = codec.encode(format, grid, settings)?;
    tracing::debug!(
        %format,
        width = grid.width(),
        height = grid.height(),
        size = bytes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "encoded image"
    );
    Ok(bytes)
}

/// Re-encode a buffer into another format without resizing.
pub fn convert(
    codec: &impl ImageCodec,
    source: Format,
    target: Format,
    bytes: &[u8],
    settings: &EncodeSettings,
) -> Result<Vec<u8>> {
    let grid = decode(codec, source, bytes)?;
    encode(codec, target, &grid, settings)
}

/// [`convert`] for callers holding format names (MIME subtypes, CLI flags).
///
/// Both names are parsed before any decoding happens, so an unknown name fails
/// with [`ImagingError::UnsupportedFormat`] even when the bytes are valid.
pub fn convert_by_name(
    codec: &impl ImageCodec,
    source: &str,
    target: &str,
    bytes: &[u8],
    settings: &EncodeSettings,
) -> Result<Vec<u8>> {
    let source: Format = source.parse()?;
    let target: Format = target.parse()?;
    convert(codec, source, target, bytes, settings)
}

/// Resample a grid to exactly `width x height` with a Lanczos3 filter.
pub fn resize(grid: &PixelGrid, width: u32, height: u32) -> PixelGrid {
    if grid.width() == width && grid.height() == height {
        return grid.clone();
    }
    let resized = image::imageops::resize(
        grid.as_rgba_image(),
        width,
        height,
        FilterType::Lanczos3,
    );
    PixelGrid::from_rgba_image(resized)
}

/// Plan thumbnail dimensions without touching pixels.
pub fn plan_thumbnail(source: Dimensions, bounds: &ThumbnailBounds) -> Dimensions {
    let (width, height) = calculate_contain_dimensions(
        (source.width, source.height),
        (bounds.max_width, bounds.max_height),
    );
    Dimensions { width, height }
}

/// Decode, contain-fit into `bounds`, and encode to AVIF.
///
/// Either a complete thumbnail is returned or an error; there is no partial
/// output.
pub fn make_thumbnail(
    codec: &impl ImageCodec,
    bytes: &[u8],
    source: Format,
    bounds: &ThumbnailBounds,
    settings: &EncodeSettings,
) -> Result<ThumbnailResult> {
    let grid = decode(codec, source, bytes)?;
    let original = grid.dimensions();
    let target = plan_thumbnail(original, bounds);
    let resized = resize(&grid, target.width, target.height);
    let encoded = encode(codec, THUMBNAIL_FORMAT, &resized, settings)?;

    Ok(ThumbnailResult {
        data_url: to_data_url(THUMBNAIL_FORMAT, &encoded),
        bytes: encoded,
        width: target.width,
        height: target.height,
        source: original,
    })
}
