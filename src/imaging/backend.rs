//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the single seam between thumbnail planning
//! and pixel work. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests swap in a recording mock.

use super::params::ThumbnailParams;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported image format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("Failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("JPEG encode failed: {0}")]
    Encode(String),
}

/// Width and height of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// What a thumbnail operation produced: the decoded source size and the
/// size actually written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rendered {
    pub original: Dimensions,
    pub thumbnail: Dimensions,
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared by request handlers and the rayon
/// pool used for warming the cache.
pub trait ImageBackend: Sync {
    /// Decode `params.source`, fit it inside `params.max_edge`, and write a
    /// JPEG to `params.output`.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Rendered, BackendError>;
}
