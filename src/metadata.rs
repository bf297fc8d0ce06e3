//! EXIF metadata extraction: GPS position and capture time.
//!
//! Extraction is best-effort. A photo without usable EXIF (screenshots,
//! stripped exports, messaging-app recompressions) is normal input, so
//! [`extract`] never returns an error: every failure inside the EXIF walk is a
//! typed [`ExifError`] that is logged at `debug` and mapped to `None` at the
//! boundary.
//!
//! ## Containers
//!
//! `kamadak-exif` locates the TIFF structure inside JPEG (APP1), raw TIFF,
//! PNG (`eXIf` chunk), WebP and HEIF/AVIF containers, so the same call serves
//! every supported input format.
//!
//! ## Fields
//!
//! - **Position**: `GPSLatitude`/`GPSLongitude` degree-minute-second rationals,
//!   signed by `GPSLatitudeRef` (`S` negative) and `GPSLongitudeRef` (`W`
//!   negative). The two coordinates are coupled: if either cannot be resolved
//!   both are `None`.
//!
//! - **Capture time**: `DateTimeOriginal`, falling back to `DateTime` only
//!   when the former is absent. EXIF timestamps carry no zone, so the value is
//!   read as a naive wall-clock time and reported as if it were UTC. The
//!   separate offset tags are not consulted.

use chrono::NaiveDateTime;
use exif::{Exif, In, Reader, Tag, Value};
use serde::Serialize;
use std::io::Cursor;
use thiserror::Error;

/// Location and time recovered from a photo's EXIF block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExifMetadata {
    /// Decimal degrees, negative south of the equator.
    pub latitude: Option<f64>,
    /// Decimal degrees, negative west of Greenwich.
    pub longitude: Option<f64>,
    /// Unix epoch milliseconds of the naive capture time read as UTC.
    pub capture_time_millis: Option<i64>,
}

impl ExifMetadata {
    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

#[derive(Error, Debug)]
enum ExifError {
    #[error("no readable EXIF block: {0}")]
    Container(#[from] exif::Error),
    #[error("tag {0} is absent")]
    MissingTag(Tag),
    #[error("tag {tag} is malformed: {reason}")]
    MalformedTag { tag: Tag, reason: String },
}

/// Extract GPS position and capture time from an encoded image.
///
/// Never fails: missing or corrupt data yields `None` fields.
pub fn extract(bytes: &[u8]) -> ExifMetadata {
    let exif = match read_exif(bytes) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!(error = %e, "skipping EXIF extraction");
            return ExifMetadata::default();
        }
    };

    let (latitude, longitude) = match read_position(&exif) {
        Ok((lat, lon)) => (Some(lat), Some(lon)),
        Err(e) => {
            tracing::debug!(error = %e, "no GPS position");
            (None, None)
        }
    };

    let capture_time_millis = match read_capture_time(&exif) {
        Ok(millis) => Some(millis),
        Err(e) => {
            tracing::debug!(error = %e, "no capture time");
            None
        }
    };

    ExifMetadata {
        latitude,
        longitude,
        capture_time_millis,
    }
}

fn read_exif(bytes: &[u8]) -> Result<Exif, ExifError> {
    Ok(Reader::new().read_from_container(&mut Cursor::new(bytes))?)
}

fn read_position(exif: &Exif) -> Result<(f64, f64), ExifError> {
    let lat = read_coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, 'S', 90.0)?;
    let lon = read_coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, 'W', 180.0)?;
    Ok((lat, lon))
}

/// Resolve one coordinate to signed decimal degrees.
///
/// A missing reference tag is read as the positive hemisphere.
fn read_coordinate(
    exif: &Exif,
    coord_tag: Tag,
    ref_tag: Tag,
    negative_ref: char,
    limit: f64,
) -> Result<f64, ExifError> {
    let field = exif
        .get_field(coord_tag, In::PRIMARY)
        .ok_or(ExifError::MissingTag(coord_tag))?;
    let degrees = dms_to_degrees(&field.value).ok_or_else(|| ExifError::MalformedTag {
        tag: coord_tag,
        reason: "expected 1-3 finite rationals".to_string(),
    })?;
    if degrees > limit {
        return Err(ExifError::MalformedTag {
            tag: coord_tag,
            reason: format!("{degrees} exceeds {limit}"),
        });
    }

    let sign = match exif.get_field(ref_tag, In::PRIMARY) {
        None => 1.0,
        Some(f) => match first_ascii(&f.value).and_then(|s| s.chars().next()) {
            Some(c) if c.eq_ignore_ascii_case(&negative_ref) => -1.0,
            Some(c) if matches!(c.to_ascii_uppercase(), 'N' | 'S' | 'E' | 'W') => 1.0,
            _ => {
                return Err(ExifError::MalformedTag {
                    tag: ref_tag,
                    reason: "expected a hemisphere letter".to_string(),
                });
            }
        },
    };

    Ok(sign * degrees)
}

/// Degrees + minutes/60 + seconds/3600 from up to three rationals.
fn dms_to_degrees(value: &Value) -> Option<f64> {
    let Value::Rational(parts) = value else {
        return None;
    };
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let total: f64 = parts
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(r, div)| r.to_f64() / div)
        .sum();
    total.is_finite().then_some(total)
}

fn read_capture_time(exif: &Exif) -> Result<i64, ExifError> {
    let (tag, field) = [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .find_map(|tag| exif.get_field(tag, In::PRIMARY).map(|f| (tag, f)))
        .ok_or(ExifError::MissingTag(Tag::DateTimeOriginal))?;

    let raw = first_ascii(&field.value).ok_or_else(|| ExifError::MalformedTag {
        tag,
        reason: "expected an ASCII value".to_string(),
    })?;
    parse_exif_datetime(&raw).ok_or_else(|| ExifError::MalformedTag {
        tag,
        reason: format!("{raw:?} is not YYYY:MM:DD HH:MM:SS"),
    })
}

/// Parse an EXIF `YYYY:MM:DD HH:MM:SS` string into epoch milliseconds,
/// treating the naive time as UTC.
///
/// The first two colons become hyphens before parsing; anything that is not a
/// real calendar time afterwards yields `None`.
///
/// ```
/// # use photo_ingest::metadata::parse_exif_datetime;
/// assert_eq!(parse_exif_datetime("2023:07:04 10:15:30"), Some(1_688_465_730_000));
/// assert_eq!(parse_exif_datetime("not-a-date"), None);
/// ```
pub fn parse_exif_datetime(raw: &str) -> Option<i64> {
    let normalized = raw.trim().replacen(':', "-", 2);
    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

fn first_ascii(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts.first().map(|bytes| {
            String::from_utf8_lossy(bytes)
                .trim_matches(char::from(0))
                .trim()
                .to_string()
        }),
        _ => None,
    }
}
