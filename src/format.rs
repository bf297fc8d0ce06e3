//! Supported image formats.
//!
//! The pipeline understands exactly three encoded formats. Everything that
//! arrives as a string (a MIME subtype from an upload, a file extension, a CLI
//! flag) is parsed into [`Format`] once, here; past this point dispatch is an
//! exhaustive `match`.
//!
//! | Name(s) | Variant | MIME type |
//! |---|---|---|
//! | `jpeg`, `jpg` | [`Format::Jpeg`] | `image/jpeg` |
//! | `png` | [`Format::Png`] | `image/png` |
//! | `avif` | [`Format::Avif`] | `image/avif` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// A format name outside the supported set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported image format: {0:?} (expected one of avif, jpeg, png)")]
pub struct UnsupportedFormat(pub String);

/// Encoded image format handled by the codec layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Jpeg,
    Png,
    Avif,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Jpeg, Format::Png, Format::Avif];

    /// Canonical lowercase name (`"jpeg"`, `"png"`, `"avif"`).
    pub fn name(self) -> &'static str {
        match self {
            Format::Jpeg => "jpeg",
            Format::Png => "png",
            Format::Avif => "avif",
        }
    }

    /// Preferred file extension for output files.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Jpeg => "jpg",
            Format::Png => "png",
            Format::Avif => "avif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Format::Jpeg => "image/jpeg",
            Format::Png => "image/png",
            Format::Avif => "image/avif",
        }
    }

    /// Parse a full MIME type such as `image/jpeg`.
    ///
    /// Only the `image/` top-level type is accepted; the subtype goes through
    /// the same parser as [`FromStr`].
    pub fn from_mime(mime: &str) -> Result<Self, UnsupportedFormat> {
        match mime.trim().split_once('/') {
            Some((top, subtype)) if top.eq_ignore_ascii_case("image") => subtype.parse(),
            _ => Err(UnsupportedFormat(mime.to_string())),
        }
    }

    /// Infer the format from a path's extension (case-insensitive).
    pub fn from_extension(path: &Path) -> Result<Self, UnsupportedFormat> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        ext.parse()
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            Format::Jpeg => image::ImageFormat::Jpeg,
            Format::Png => image::ImageFormat::Png,
            Format::Avif => image::ImageFormat::Avif,
        }
    }
}

impl FromStr for Format {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Format::Jpeg),
            "png" => Ok(Format::Png),
            "avif" => Ok(Format::Avif),
            _ => Err(UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// File extensions the ingest command picks up when walking a directory.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &["jpg", "jpeg", "png", "avif"]
}
