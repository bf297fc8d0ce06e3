//! Shared test utilities for the photo-ingest test suite.
//!
//! Everything is synthesised in memory: encoded JPEG/PNG buffers from
//! gradient grids, and EXIF blocks written with `kamadak-exif`'s experimental
//! writer. JPEG carries the block as a spliced APP1 segment, PNG as an `eXIf`
//! chunk and AVIF as an `Exif` item, the latter two written by the encoders.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let bytes = jpeg_with_exif(&gps_fields((33, 52, 4), "S", (151, 12, 36), "E"));
//! let meta = crate::metadata::extract(&bytes);
//! assert!(meta.latitude.unwrap() < 0.0);
//! ```

use crate::imaging::PixelGrid;
use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::codecs::avif::AvifEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};

// =========================================================================
// Synthetic images
// =========================================================================

/// RGBA gradient grid: red follows x, green follows y, opaque.
pub fn gradient_grid(width: u32, height: u32) -> PixelGrid {
    PixelGrid::from_rgba_image(RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    }))
}

/// Encode a gradient as a baseline JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Encode a gradient as an RGBA PNG with alpha fixed at 200.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 200])
    });
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
        .unwrap();
    out
}

// =========================================================================
// EXIF construction
// =========================================================================

pub fn ascii_field(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

pub fn rational_field(tag: Tag, parts: &[(u32, u32)]) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(
            parts
                .iter()
                .map(|&(num, denom)| Rational { num, denom })
                .collect(),
        ),
    }
}

/// Full GPS position as whole degree/minute/second triples plus references.
pub fn gps_fields(
    lat: (u32, u32, u32),
    lat_ref: &str,
    lon: (u32, u32, u32),
    lon_ref: &str,
) -> Vec<Field> {
    vec![
        rational_field(Tag::GPSLatitude, &[(lat.0, 1), (lat.1, 1), (lat.2, 1)]),
        ascii_field(Tag::GPSLatitudeRef, lat_ref),
        rational_field(Tag::GPSLongitude, &[(lon.0, 1), (lon.1, 1), (lon.2, 1)]),
        ascii_field(Tag::GPSLongitudeRef, lon_ref),
    ]
}

/// Serialise fields into a big-endian TIFF/EXIF structure.
pub fn tiff_exif(fields: &[Field]) -> Vec<u8> {
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut buf = std::io::Cursor::new(Vec::new());
    writer.write(&mut buf, false).unwrap();
    buf.into_inner()
}

/// A 32x24 JPEG carrying the given EXIF fields in an APP1 segment.
pub fn jpeg_with_exif(fields: &[Field]) -> Vec<u8> {
    let jpeg = jpeg_bytes(32, 24);
    let tiff = tiff_exif(fields);

    let payload_len = 2 + 6 + tiff.len();
    let mut out = Vec::with_capacity(jpeg.len() + payload_len + 2);
    out.extend_from_slice(&jpeg[..2]); // SOI
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&(payload_len as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// A 24x16 PNG with the given EXIF fields in an `eXIf` chunk.
pub fn png_with_exif(fields: &[Field]) -> Vec<u8> {
    let img = gradient_grid(24, 16).into_rgba_image();
    let mut out = Vec::new();
    let mut encoder = PngEncoder::new(&mut out);
    encoder.set_exif_metadata(tiff_exif(fields)).unwrap();
    encoder
        .write_image(img.as_raw(), 24, 16, ExtendedColorType::Rgba8)
        .unwrap();
    out
}

/// A 24x16 AVIF with the given EXIF fields stored as an `Exif` item.
pub fn avif_with_exif(fields: &[Field]) -> Vec<u8> {
    let img = gradient_grid(24, 16).into_rgba_image();
    let mut out = Vec::new();
    let mut encoder = AvifEncoder::new_with_speed_quality(&mut out, 10, 60);
    encoder.set_exif_metadata(tiff_exif(fields)).unwrap();
    encoder
        .write_image(img.as_raw(), 24, 16, ExtendedColorType::Rgba8)
        .unwrap();
    out
}
