//! Image transcoding in pure Rust, no system codec libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions`, `avif-parse` |
//! | **Decode** | `image` (JPEG, PNG), `avif-parse` + `rav1d` (AVIF) |
//! | **Resize** | `image::imageops::resize` with Lanczos3, contain-fit |
//! | **Encode** | `image` codecs, AVIF via rav1e |
//! | **Data URL** | `base64` standard alphabet |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Encoder settings and thumbnail bounds
//! - **Backend**: [`ImageCodec`] trait + [`PixelGrid`] + [`RustCodec`]
//! - **Operations**: High-level functions combining calculations + codec

pub mod backend;
mod calculations;
pub mod data_url;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{Dimensions, ImageCodec, ImagingError, PixelGrid};
pub use calculations::calculate_contain_dimensions;
pub use data_url::{from_data_url, to_data_url};
pub use operations::{
    THUMBNAIL_FORMAT, ThumbnailResult, convert, convert_by_name, decode, encode, get_dimensions,
    make_thumbnail, plan_thumbnail, resize,
};
pub use params::{
    DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, EncodeSettings, Quality, Speed, ThumbnailBounds,
};
pub use rust_backend::RustCodec;
