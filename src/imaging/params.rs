//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! [`operations`](super::operations), which decides what to produce, and the
//! [`backend`](super::backend), which does the pixel work. Swapping the
//! backend for a mock in tests leaves the planning logic untouched.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 75). Clamped on construction.
//! - [`SourceFormat`]: Decoder choice, picked from the source file extension.
//! - [`ThumbnailParams`]: Everything needed to render one thumbnail: source, output, bound, quality.

use std::path::{Path, PathBuf};

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

/// 75 is the JPEG codec's own default.
impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// Decoder used for a source image.
///
/// Chosen by file extension only, never by sniffing content. The match is
/// case-sensitive, same as the directory lister's image filter: `photo.PNG`
/// has no decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Png,
    Jpeg,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str())? {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Parameters for a thumbnail operation (decode, fit inside `max_edge`, encode JPEG).
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub format: SourceFormat,
    pub output: PathBuf,
    /// Upper bound for the longer edge. Smaller images keep their size.
    pub max_edge: u32,
    pub quality: Quality,
}
