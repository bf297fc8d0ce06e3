//! End-to-end tests through the public API with synthetic photos.

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use photo_ingest::format::Format;
use photo_ingest::imaging::{
    self, EncodeSettings, ImageCodec, ImagingError, RustCodec, ThumbnailBounds,
};
use photo_ingest::ingest::{self, IngestSettings};
use photo_ingest::metadata;
use std::fs;

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 90])
    });
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

fn field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

fn dms(d: u32, m: u32, s: u32) -> Value {
    Value::Rational(vec![
        Rational { num: d, denom: 1 },
        Rational { num: m, denom: 1 },
        Rational { num: s, denom: 1 },
    ])
}

fn ascii(text: &str) -> Value {
    Value::Ascii(vec![text.as_bytes().to_vec()])
}

/// A JPEG of the given size shot in Sydney on 2023-07-04 10:15:30.
fn sydney_jpeg(width: u32, height: u32) -> Vec<u8> {
    let fields = [
        field(Tag::GPSLatitude, dms(33, 52, 4)),
        field(Tag::GPSLatitudeRef, ascii("S")),
        field(Tag::GPSLongitude, dms(151, 12, 36)),
        field(Tag::GPSLongitudeRef, ascii("E")),
        field(Tag::DateTimeOriginal, ascii("2023:07:04 10:15:30")),
    ];
    let mut writer = Writer::new();
    for f in &fields {
        writer.push_field(f);
    }
    let mut tiff = std::io::Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let body = jpeg(width, height);
    let mut out = body[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&body[2..]);
    out
}

#[test]
fn upload_yields_position_time_and_thumbnail() {
    let bytes = sydney_jpeg(64, 48);
    let image = ingest::ingest_bytes(
        &RustCodec::new(),
        &bytes,
        Format::Jpeg,
        &IngestSettings::default(),
    )
    .unwrap();

    let lat = image.metadata.latitude.unwrap();
    let lon = image.metadata.longitude.unwrap();
    assert!((lat - -33.867_777).abs() < 1e-5, "lat = {lat}");
    assert!((lon - 151.21).abs() < 1e-5, "lon = {lon}");
    assert_eq!(image.metadata.capture_time_millis, Some(1_688_465_730_000));

    assert_eq!((image.thumbnail.width, image.thumbnail.height), (480, 360));
    let (format, avif) = imaging::from_data_url(&image.thumbnail.data_url).unwrap();
    assert_eq!(format, Format::Avif);
    assert_eq!(avif, image.thumbnail.bytes);

    let dims = RustCodec::new().identify(Format::Avif, &avif).unwrap();
    assert_eq!((dims.width, dims.height), (480, 360));
}

#[test]
fn photo_without_exif_still_thumbnails() {
    let bytes = jpeg(90, 160);
    assert_eq!(metadata::extract(&bytes), metadata::ExifMetadata::default());

    let thumb = imaging::make_thumbnail(
        &RustCodec::new(),
        &bytes,
        Format::Jpeg,
        &ThumbnailBounds::default(),
        &EncodeSettings::default(),
    )
    .unwrap();
    assert_eq!((thumb.width, thumb.height), (480, 853));
}

#[test]
fn garbage_bytes_fail_thumbnail_but_not_extraction() {
    let garbage = b"definitely not a photo".to_vec();
    assert_eq!(metadata::extract(&garbage), metadata::ExifMetadata::default());

    let err = imaging::make_thumbnail(
        &RustCodec::new(),
        &garbage,
        Format::Jpeg,
        &ThumbnailBounds::default(),
        &EncodeSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ImagingError::Decode(_)));
}

#[test]
fn convert_between_formats_by_name() {
    let codec = RustCodec::new();
    let settings = EncodeSettings::default();
    let source = jpeg(40, 20);

    let png = imaging::convert_by_name(&codec, "jpeg", "png", &source, &settings).unwrap();
    assert_eq!(
        codec.identify(Format::Png, &png).unwrap(),
        imaging::Dimensions {
            width: 40,
            height: 20
        }
    );

    let avif = imaging::convert_by_name(&codec, "png", "avif", &png, &settings).unwrap();
    let back = imaging::decode(&codec, Format::Avif, &avif).unwrap();
    assert_eq!((back.width(), back.height()), (40, 20));

    let err = imaging::convert_by_name(&codec, "gif", "png", &source, &settings).unwrap_err();
    assert!(matches!(err, ImagingError::UnsupportedFormat(_)));
    let err = imaging::convert_by_name(&codec, "jpeg", "webp", &source, &settings).unwrap_err();
    assert!(matches!(err, ImagingError::UnsupportedFormat(_)));
}

#[test]
fn directory_batch_writes_manifest() {
    let tmp = tempfile::TempDir::new().unwrap();
    let uploads = tmp.path().join("uploads");
    fs::create_dir_all(uploads.join("trip")).unwrap();
    fs::write(uploads.join("trip/harbour.jpg"), sydney_jpeg(120, 80)).unwrap();
    fs::write(uploads.join("plain.jpeg"), jpeg(30, 60)).unwrap();
    fs::write(uploads.join("readme.md"), "# uploads").unwrap();

    let settings = IngestSettings {
        bounds: ThumbnailBounds::new(100, 100),
        encode: EncodeSettings::default(),
    };
    let manifest = ingest::ingest_dir(&RustCodec::new(), &uploads, &settings, None).unwrap();
    assert!(manifest.failed.is_empty());

    let out = tmp.path().join("manifest.json");
    ingest::write_manifest(&manifest, &out).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();

    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["source_path"], "plain.jpeg");
    assert_eq!(images[0]["thumbnail"]["width"], 50);
    assert_eq!(images[0]["thumbnail"]["height"], 100);
    assert_eq!(images[1]["source_path"], "trip/harbour.jpg");
    assert_eq!(images[1]["dimensions"]["width"], 120);
    assert_eq!(images[1]["metadata"]["capture_time_millis"], 1_688_465_730_000i64);
    assert!(images[1]["metadata"].get("captureTimeMillis").is_none());
    let thumb_keys: Vec<&String> = images[1]["thumbnail"].as_object().unwrap().keys().collect();
    assert_eq!(thumb_keys, vec!["data_url", "height", "width"]);
    assert!(json.get("failed").is_none());
}
