//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend, Rendered};
use super::params::{Quality, SourceFormat, ThumbnailParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailConfig {
    /// Bound for the longer edge, in pixels.
    pub max_edge: u32,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_edge: 1200,
            quality: Quality::default(),
        }
    }
}

/// Plan a thumbnail operation without executing it.
///
/// Fails with [`BackendError::UnsupportedFormat`] when the source extension
/// is neither PNG nor JPEG, before any file is opened.
pub fn plan_thumbnail(
    source: &Path,
    output_path: &Path,
    config: &ThumbnailConfig,
) -> Result<ThumbnailParams> {
    let format = SourceFormat::from_path(source)
        .ok_or_else(|| BackendError::UnsupportedFormat(source.to_path_buf()))?;

    Ok(ThumbnailParams {
        source: source.to_path_buf(),
        format,
        output: output_path.to_path_buf(),
        max_edge: config.max_edge,
        quality: config.quality,
    })
}

/// Create a thumbnail image at `output_path`.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output_path: &Path,
    config: &ThumbnailConfig,
) -> Result<Rendered> {
    let params = plan_thumbnail(source, output_path, config)?;
    backend.thumbnail(&params)
}
