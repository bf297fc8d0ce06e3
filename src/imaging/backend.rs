//! Codec trait and shared imaging types.
//!
//! The [`ImageCodec`] trait defines the three primitives every codec must
//! support: identify, decode, and encode. Resizing is not part of the trait;
//! it is a pure function over [`PixelGrid`]s (see
//! [`operations`](super::operations)).
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec). Tests substitute
//! `MockCodec`, which records calls and returns canned grids.

use super::params::EncodeSettings;
use crate::format::{Format, UnsupportedFormat};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("{0}")]
    UnsupportedFormat(#[from] UnsupportedFormat),
    #[error("failed to encode image: {0}")]
    Encode(String),
    #[error("pixel buffer of {len} bytes does not match {width}x{height} RGBA")]
    InvalidGrid { width: u32, height: u32, len: usize },
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Decoded raster: row-major RGBA8, exactly `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    image: image::RgbaImage,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImagingError> {
        let len = data.len();
        if len != width as usize * height as usize * 4 {
            return Err(ImagingError::InvalidGrid { width, height, len });
        }
        image::RgbaImage::from_raw(width, height, data)
            .map(Self::from_rgba_image)
            .ok_or(ImagingError::InvalidGrid { width, height, len })
    }

    pub fn from_rgba_image(image: image::RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Borrow the raster as an `image` buffer for resampling and encoding.
    pub fn as_rgba_image(&self) -> &image::RgbaImage {
        &self.image
    }

    pub fn into_rgba_image(self) -> image::RgbaImage {
        self.image
    }
}

/// Trait for image codecs.
///
/// Implementations are stateless and shared across threads (`Sync`), so the
/// same codec can serve parallel uploads without locking.
pub trait ImageCodec: Sync {
    /// Read dimensions from the container header without decoding pixels.
    fn identify(&self, format: Format, bytes: &[u8]) -> Result<Dimensions, ImagingError>;

    /// Decode an encoded buffer into an RGBA grid.
    fn decode(&self, format: Format, bytes: &[u8]) -> Result<PixelGrid, ImagingError>;

    /// Encode a grid into the given format.
    fn encode(
        &self,
        format: Format,
        grid: &PixelGrid,
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>, ImagingError>;
}
