//! # Photo Ingest
//!
//! The image ingestion stage of a photo-sharing backend. For every uploaded
//! photo it derives two things, independently:
//!
//! - **Metadata**: GPS latitude/longitude in signed decimal degrees and the
//!   capture time in epoch milliseconds, read from the EXIF block.
//! - **Thumbnail**: the photo decoded, contain-fitted into a portrait phone
//!   box (480×854 by default), re-encoded as AVIF and wrapped in a base64
//!   `data:` URL ready to be embedded inline.
//!
//! ```text
//!                  ┌─► metadata::extract ─────────► ExifMetadata
//! upload bytes ────┤
//!                  └─► imaging::make_thumbnail ───► ThumbnailResult (AVIF data URL)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`format`] | Closed set of image formats (JPEG, PNG, AVIF), MIME and extension mapping |
//! | [`metadata`] | EXIF GPS and capture-time extraction; never fails, absent fields are `None` |
//! | [`imaging`] | Pure-Rust decode, Lanczos3 resize, encode, thumbnail and data URL helpers |
//! | [`ingest`] | Combined per-photo ingest and parallel directory batches with progress events |
//! | [`config`] | `config.toml` loading, validation and merging over stock defaults |
//! | [`output`] | CLI output formatting for every command |
//! | [`logging`] | `tracing` subscriber setup (stderr, text or JSON) |
//!
//! # Design Decisions
//!
//! ## Formats Are a Closed Enum
//!
//! Format names arrive as strings (MIME subtypes, CLI flags, file
//! extensions) but are parsed once into [`format::Format`] at the boundary.
//! Past that point an unsupported format cannot be expressed, so the only
//! place that reports one is the parser.
//!
//! ## Metadata Extraction Cannot Fail
//!
//! A photo without EXIF, or with a corrupt GPS block, is still a perfectly
//! good photo. [`metadata::extract`] returns an [`metadata::ExifMetadata`]
//! with each field independently present or absent and logs why a field was
//! dropped at debug level.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding uses the `image` crate for JPEG and PNG and `avif-parse` + `rav1d`
//! for AVIF; AVIF encoding uses `rav1e` through `image`. No system libraries
//! are needed, and the codec sits behind the [`imaging::ImageCodec`] trait so
//! pipeline logic is tested against a recording mock.
//!
//! ## AVIF Thumbnails
//!
//! Thumbnails are always AVIF. The format is supported by every current
//! browser and is markedly smaller than JPEG at the same visual quality,
//! which matters when the thumbnail is inlined as base64.

pub mod config;
pub mod format;
pub mod imaging;
pub mod ingest;
pub mod logging;
pub mod metadata;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
