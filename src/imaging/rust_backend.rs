//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image::ImageReader` with the format forced by extension |
//! | Resize | `DynamicImage::resize_exact` with `CatmullRom` (bicubic) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, Dimensions, ImageBackend, Rendered};
use super::calculations::calculate_fit_dimensions;
use super::params::{SourceFormat, ThumbnailParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageReader};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk with the decoder for `format`.
///
/// A file whose body does not match its extension fails here as
/// [`BackendError::Decode`]. Failing to read the file at all, even after it
/// opened, is [`BackendError::Io`].
fn load_image(path: &Path, format: SourceFormat) -> Result<DynamicImage, BackendError> {
    let mut reader = ImageReader::open(path).map_err(BackendError::Io)?;
    reader.set_format(format.image_format());
    reader.decode().map_err(|e| match e {
        ImageError::IoError(io) => BackendError::Io(io),
        other => BackendError::Decode {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })
}

/// Encode as baseline JPEG. Alpha and 16-bit inputs are flattened to RGB8
/// first since the encoder rejects them.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), BackendError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(e.to_string()))?;
    writer.flush().map_err(BackendError::Io)
}

impl ImageBackend for RustBackend {
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Rendered, BackendError> {
        let img = load_image(&params.source, params.format)?;
        let original = Dimensions {
            width: img.width(),
            height: img.height(),
        };

        let (width, height) =
            calculate_fit_dimensions((original.width, original.height), params.max_edge);
        let fitted = if (width, height) == (original.width, original.height) {
            img
        } else {
            img.resize_exact(width, height, FilterType::CatmullRom)
        };

        save_jpeg(&fitted, &params.output, params.quality.value() as u8)?;

        Ok(Rendered {
            original,
            thumbnail: Dimensions { width, height },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use crate::test_helpers::{create_test_jpeg, create_test_png};

    fn params(source: &Path, output: &Path, format: SourceFormat) -> ThumbnailParams {
        ThumbnailParams {
            source: source.to_path_buf(),
            format,
            output: output.to_path_buf(),
            max_edge: 1200,
            quality: Quality::default(),
        }
    }

    #[test]
    fn thumbnail_landscape_jpeg_is_bounded() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("wide.jpg");
        create_test_jpeg(&source, 2400, 1600);
        let output = tmp.path().join("thumb.jpg");

        let rendered = RustBackend::new()
            .thumbnail(&params(&source, &output, SourceFormat::Jpeg))
            .unwrap();

        assert_eq!(
            rendered.original,
            Dimensions {
                width: 2400,
                height: 1600
            }
        );
        assert_eq!(
            rendered.thumbnail,
            Dimensions {
                width: 1200,
                height: 800
            }
        );
        assert_eq!(image::image_dimensions(&output).unwrap(), (1200, 800));
    }

    #[test]
    fn thumbnail_portrait_png_with_alpha_encodes_as_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("tall.png");
        create_test_png(&source, 600, 1500);
        let output = tmp.path().join("thumb.jpg");

        let rendered = RustBackend::new()
            .thumbnail(&params(&source, &output, SourceFormat::Png))
            .unwrap();

        assert_eq!(
            rendered.thumbnail,
            Dimensions {
                width: 480,
                height: 1200
            }
        );
        let format = ImageReader::open(&output)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .format();
        assert_eq!(format, Some(image::ImageFormat::Jpeg));
    }

    #[test]
    fn thumbnail_small_image_is_not_upscaled() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("small.jpg");
        create_test_jpeg(&source, 320, 200);
        let output = tmp.path().join("thumb.jpg");

        let rendered = RustBackend::new()
            .thumbnail(&params(&source, &output, SourceFormat::Jpeg))
            .unwrap();

        assert_eq!(rendered.thumbnail, rendered.original);
        assert_eq!(image::image_dimensions(&output).unwrap(), (320, 200));
    }

    #[test]
    fn thumbnail_nonexistent_source_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = RustBackend::new().thumbnail(&params(
            Path::new("/nonexistent/image.jpg"),
            &tmp.path().join("thumb.jpg"),
            SourceFormat::Jpeg,
        ));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn thumbnail_unreadable_source_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("folder.jpg");
        std::fs::create_dir(&source).unwrap();

        let result = RustBackend::new().thumbnail(&params(
            &source,
            &tmp.path().join("thumb.jpg"),
            SourceFormat::Jpeg,
        ));
        assert!(matches!(result, Err(BackendError::Io(_))), "got {result:?}");
    }

    #[test]
    fn thumbnail_body_not_matching_extension_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("fake.png");
        std::fs::write(&source, b"definitely not a png").unwrap();

        let result = RustBackend::new().thumbnail(&params(
            &source,
            &tmp.path().join("thumb.jpg"),
            SourceFormat::Png,
        ));
        match result {
            Err(BackendError::Decode { path, .. }) => assert_eq!(path, source),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn thumbnail_jpeg_decoder_rejects_png_body() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("really-a-png.jpg");
        create_test_png(&source, 40, 30);

        let result = RustBackend::new().thumbnail(&params(
            &source,
            &tmp.path().join("thumb.jpg"),
            SourceFormat::Jpeg,
        ));
        assert!(matches!(result, Err(BackendError::Decode { .. })));
    }
}
