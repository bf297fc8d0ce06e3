//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. They are the interface
//! between the high-level [`operations`](super::operations) module and the
//! [`backend`](super::backend) codec that does the pixel work.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100). Clamped on construction.
//! - [`Speed`] — AVIF encoder speed (1–10, higher is faster). Clamped on construction.
//! - [`EncodeSettings`] — Fixed encoder configuration for every output format.
//! - [`ThumbnailBounds`] — Bounding box a thumbnail is contain-fit into.

/// Default thumbnail bounding box width (a portrait phone screen).
pub const DEFAULT_MAX_WIDTH: u32 = 480;

/// Default thumbnail bounding box height.
pub const DEFAULT_MAX_HEIGHT: u32 = 854;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// rav1e speed preset (1 = slowest/best, 10 = fastest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Speed(u8);

impl Speed {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 10))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self(6)
    }
}

/// Encoder configuration. Identical settings and an identical grid always
/// produce identical bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    pub avif_quality: Quality,
    pub avif_speed: Speed,
    pub jpeg_quality: Quality,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            avif_quality: Quality::new(60),
            avif_speed: Speed::default(),
            jpeg_quality: Quality::default(),
        }
    }
}

/// Bounding box for contain-fit thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailBounds {
    pub max_width: u32,
    pub max_height: u32,
}

impl ThumbnailBounds {
    /// Zero bounds are bumped to one pixel.
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width: max_width.max(1),
            max_height: max_height.max(1),
        }
    }
}

impl Default for ThumbnailBounds {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WIDTH, DEFAULT_MAX_HEIGHT)
    }
}
