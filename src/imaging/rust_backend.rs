//! Pure Rust codec with no system library dependencies.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image` crate (pure Rust decoders) |
//! | Decode (AVIF) | `avif-parse` (container) + `rav1d` (AV1 colour and alpha items) |
//! | Identify (AVIF) | `avif-parse` primary item metadata |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e) |
//! | Encode → PNG / JPEG | `image::codecs::{png, jpeg}` |

use super::backend::{Dimensions, ImageCodec, ImagingError, PixelGrid};
use super::params::EncodeSettings;
use crate::format::Format;
use image::buffer::ConvertBuffer;
use image::{ExtendedColorType, ImageEncoder, ImageReader, RgbImage};
use std::io::Cursor;
use std::ptr::NonNull;

/// Pure Rust codec using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

/// Decode JPEG or PNG through the `image` crate with an explicit format.
fn decode_with_image(format: Format, bytes: &[u8]) -> Result<PixelGrid, ImagingError> {
    let img = image::load_from_memory_with_format(bytes, format.image_format())
        .map_err(|e| ImagingError::Decode(format!("{format}: {e}")))?;
    Ok(PixelGrid::from_rgba_image(img.to_rgba8()))
}

/// Extract dimensions from an AVIF buffer's container metadata (no full decode needed).
fn identify_avif(bytes: &[u8]) -> Result<Dimensions, ImagingError> {
    let avif = avif_parse::read_avif(&mut Cursor::new(bytes))
        .map_err(|e| ImagingError::Decode(format!("Failed to parse AVIF: {e:?}")))?;
    let meta = avif
        .primary_item_metadata()
        .map_err(|e| ImagingError::Decode(format!("Failed to read AVIF metadata: {e:?}")))?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

/// Decode an AVIF buffer: colour from the primary item, transparency from the
/// auxiliary alpha item when the container has one.
///
/// The `image` crate's `"avif"` feature only provides the encoder (rav1e).
/// Decoding through `image` requires `"avif-native"`, which links the C
/// library dav1d, so the pure Rust port `rav1d` is driven directly.
fn decode_avif(bytes: &[u8]) -> Result<PixelGrid, ImagingError> {
    let avif = avif_parse::read_avif(&mut Cursor::new(bytes))
        .map_err(|e| ImagingError::Decode(format!("Failed to parse AVIF: {e:?}")))?;
    if avif.primary_item.is_empty() {
        return Err(ImagingError::Decode("AVIF primary item is empty".into()));
    }

    let color = Av1Picture::decode(&avif.primary_item)?;
    let mut rgba = color.to_rgba()?;

    if let Some(alpha_item) = avif.alpha_item.as_deref() {
        let alpha = Av1Picture::decode(alpha_item)?;
        if (alpha.width(), alpha.height()) != (color.width(), color.height()) {
            return Err(ImagingError::Decode(format!(
                "AVIF alpha plane is {}x{}, colour is {}x{}",
                alpha.width(),
                alpha.height(),
                color.width(),
                color.height()
            )));
        }
        alpha.fill_alpha(&mut rgba)?;
        if avif.premultiplied_alpha {
            unpremultiply(&mut rgba);
        }
    }

    PixelGrid::new(color.width(), color.height(), rgba)
}

/// A single still frame decoded by rav1d.
///
/// Owns both the decoder context and the picture reference; dropping it
/// releases the picture first, then closes the context.
struct Av1Picture {
    pic: rav1d::include::dav1d::picture::Dav1dPicture,
    ctx: Option<rav1d::include::dav1d::dav1d::Dav1dContext>,
}

/// One plane of an [`Av1Picture`]: base pointer, row stride in bytes, and
/// chroma subsampling shifts.
#[derive(Clone, Copy)]
struct Plane {
    base: NonNull<u8>,
    stride: isize,
    shift_x: u32,
    shift_y: u32,
}

impl Av1Picture {
    fn decode(obu: &[u8]) -> Result<Self, ImagingError> {
        use rav1d::include::dav1d::data::Dav1dData;
        use rav1d::include::dav1d::dav1d::Dav1dSettings;
        use rav1d::src::lib as dav1d;

        let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
        // SAFETY: dav1d_default_settings fully initialises the pointee.
        let mut settings = unsafe {
            dav1d::dav1d_default_settings(NonNull::from(&mut settings).cast());
            settings.assume_init()
        };
        settings.n_threads = 1;
        settings.max_frame_delay = 1;

        let mut frame = Self {
            pic: Default::default(),
            ctx: None,
        };
        // SAFETY: both pointers come from live locals.
        let rc = unsafe {
            dav1d::dav1d_open(NonNull::new(&mut frame.ctx), NonNull::new(&mut settings))
        };
        if rc.0 != 0 {
            return Err(ImagingError::Decode(format!("rav1d open failed ({})", rc.0)));
        }

        let mut data = Dav1dData::default();
        // SAFETY: `data` is a live local; the returned buffer holds `obu.len()` bytes.
        unsafe {
            let buf = dav1d::dav1d_data_create(NonNull::new(&mut data), obu.len());
            if buf.is_null() {
                return Err(ImagingError::Decode("rav1d data_create failed".into()));
            }
            std::ptr::copy_nonoverlapping(obu.as_ptr(), buf, obu.len());
        }

        // SAFETY: the context was opened above; send_data takes ownership of
        // `data` on success and leaves it to us on failure.
        let rc = unsafe { dav1d::dav1d_send_data(frame.ctx, NonNull::new(&mut data)) };
        if rc.0 != 0 {
            unsafe { dav1d::dav1d_data_unref(NonNull::new(&mut data)) };
            return Err(ImagingError::Decode(format!("rav1d send_data failed ({})", rc.0)));
        }

        // SAFETY: the context is open and `frame.pic` is a default picture.
        let rc = unsafe { dav1d::dav1d_get_picture(frame.ctx, NonNull::new(&mut frame.pic)) };
        if rc.0 != 0 {
            return Err(ImagingError::Decode(format!("rav1d get_picture failed ({})", rc.0)));
        }
        Ok(frame)
    }

    fn width(&self) -> u32 {
        self.pic.p.w as u32
    }

    fn height(&self) -> u32 {
        self.pic.p.h as u32
    }

    fn bits(&self) -> u32 {
        self.pic.p.bpc as u32
    }

    fn plane(&self, index: usize) -> Result<Plane, ImagingError> {
        use rav1d::include::dav1d::headers::{
            DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        };

        let base = self.pic.data[index]
            .map(NonNull::cast::<u8>)
            .ok_or_else(|| ImagingError::Decode(format!("rav1d returned no plane {index}")))?;
        if index == 0 {
            return Ok(Plane {
                base,
                stride: self.pic.stride[0],
                shift_x: 0,
                shift_y: 0,
            });
        }
        let (shift_x, shift_y) = match self.pic.p.layout {
            DAV1D_PIXEL_LAYOUT_I420 => (1, 1),
            DAV1D_PIXEL_LAYOUT_I422 => (1, 0),
            _ => (0, 0),
        };
        Ok(Plane {
            base,
            stride: self.pic.stride[1],
            shift_x,
            shift_y,
        })
    }

    /// Sample at luma coordinates `(x, y)`, normalised to `0.0..=1.0`.
    fn sample(&self, plane: Plane, x: u32, y: u32) -> f32 {
        let bits = self.bits();
        let row = (y >> plane.shift_y) as isize * plane.stride;
        let col = (x >> plane.shift_x) as isize;
        // SAFETY: (x, y) lies inside the picture, and rav1d planes cover the
        // subsampled extent with the reported stride.
        let raw = unsafe {
            if bits <= 8 {
                *plane.base.as_ptr().offset(row + col) as u32
            } else {
                // 10/12-bit samples are stored as native-endian u16
                (plane.base.as_ptr().offset(row + col * 2) as *const u16).read_unaligned() as u32
            }
        };
        raw as f32 / ((1u32 << bits) - 1) as f32
    }

    /// Full-range BT.601 YCbCr to opaque RGBA8.
    fn to_rgba(&self) -> Result<Vec<u8>, ImagingError> {
        use rav1d::include::dav1d::headers::{
            DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
            DAV1D_PIXEL_LAYOUT_I444,
        };

        let layout = self.pic.p.layout;
        let chroma = match layout {
            DAV1D_PIXEL_LAYOUT_I400 => None,
            DAV1D_PIXEL_LAYOUT_I420 | DAV1D_PIXEL_LAYOUT_I422 | DAV1D_PIXEL_LAYOUT_I444 => {
                Some((self.plane(1)?, self.plane(2)?))
            }
            _ => {
                return Err(ImagingError::Decode(format!(
                    "Unsupported AVIF pixel layout: {layout}"
                )));
            }
        };
        let luma = self.plane(0)?;

        let (w, h) = (self.width(), self.height());
        let mut rgba = Vec::with_capacity(w as usize * h as usize * 4);
        for y in 0..h {
            for x in 0..w {
                let luma_val = self.sample(luma, x, y);
                let [r, g, b] = match chroma {
                    None => [luma_val; 3],
                    Some((cb_plane, cr_plane)) => {
                        let cb = self.sample(cb_plane, x, y) - 0.5;
                        let cr = self.sample(cr_plane, x, y) - 0.5;
                        [
                            luma_val + 1.402 * cr,
                            luma_val - 0.344_136 * cb - 0.714_136 * cr,
                            luma_val + 1.772 * cb,
                        ]
                    }
                };
                rgba.extend_from_slice(&[to_u8(r), to_u8(g), to_u8(b), 255]);
            }
        }
        Ok(rgba)
    }

    /// Write this monochrome picture's luma into the alpha byte of `rgba`.
    fn fill_alpha(&self, rgba: &mut [u8]) -> Result<(), ImagingError> {
        let luma = self.plane(0)?;
        let w = self.width();
        for (i, px) in rgba.chunks_exact_mut(4).enumerate() {
            let (x, y) = (i as u32 % w, i as u32 / w);
            px[3] = to_u8(self.sample(luma, x, y));
        }
        Ok(())
    }
}

impl Drop for Av1Picture {
    fn drop(&mut self) {
        use rav1d::src::lib as dav1d;
        // SAFETY: unref on a default picture and close on a `None` context are
        // both no-ops, so partially built frames are safe to drop.
        unsafe {
            dav1d::dav1d_picture_unref(NonNull::new(&mut self.pic));
            dav1d::dav1d_close(NonNull::new(&mut self.ctx));
        }
    }
}

fn to_u8(unit: f32) -> u8 {
    (unit * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Undo premultiplication: colour channels are divided by alpha.
fn unpremultiply(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u32 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

fn encode_avif(grid: &PixelGrid, settings: &EncodeSettings) -> Result<Vec<u8>, ImagingError> {
    let mut out = Vec::new();
    image::codecs::avif::AvifEncoder::new_with_speed_quality(
        &mut out,
        settings.avif_speed.value(),
        settings.avif_quality.value() as u8,
    )
    .write_image(
        grid.as_raw(),
        grid.width(),
        grid.height(),
        ExtendedColorType::Rgba8,
    )
    .map_err(|e| ImagingError::Encode(format!("AVIF encode failed: {e}")))?;
    Ok(out)
}

fn encode_png(grid: &PixelGrid) -> Result<Vec<u8>, ImagingError> {
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            grid.as_raw(),
            grid.width(),
            grid.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| ImagingError::Encode(format!("PNG encode failed: {e}")))?;
    Ok(out)
}

/// JPEG has no alpha channel; the grid is flattened to RGB first.
fn encode_jpeg(grid: &PixelGrid, settings: &EncodeSettings) -> Result<Vec<u8>, ImagingError> {
    let rgb: RgbImage = grid.as_rgba_image().convert();
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(
        &mut out,
        settings.jpeg_quality.value() as u8,
    )
    .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
    .map_err(|e| ImagingError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(out)
}

impl ImageCodec for RustCodec {
    fn identify(&self, format: Format, bytes: &[u8]) -> Result<Dimensions, ImagingError> {
        if format == Format::Avif {
            return identify_avif(bytes);
        }
        let (width, height) = ImageReader::with_format(Cursor::new(bytes), format.image_format())
            .into_dimensions()
            .map_err(|e| ImagingError::Decode(format!("Failed to read dimensions: {e}")))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, format: Format, bytes: &[u8]) -> Result<PixelGrid, ImagingError> {
        if bytes.is_empty() {
            return Err(ImagingError::Decode(format!("empty {format} buffer")));
        }
        match format {
            Format::Jpeg | Format::Png => decode_with_image(format, bytes),
            Format::Avif => decode_avif(bytes),
        }
    }

    fn encode(
        &self,
        format: Format,
        grid: &PixelGrid,
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>, ImagingError> {
        if grid.is_empty() {
            return Err(ImagingError::Encode(format!(
                "cannot encode a {}x{} grid",
                grid.width(),
                grid.height()
            )));
        }
        match format {
            Format::Avif => encode_avif(grid, settings),
            Format::Png => encode_png(grid),
            Format::Jpeg => encode_jpeg(grid, settings),
        }
    }
}
