//! The virtual-path API that the HTTP server and the CLI call.
//!
//! A [`Library`] owns the alias registry and the thumbnail cache and wires
//! them to the directory lister. Every method takes a client-supplied
//! virtual path, translates it, does the work against the filesystem, and
//! answers in virtual paths again.
//!
//! Listing `/` is special: it returns one directory entry per user alias,
//! so clients can discover the roots. The cache alias is never listed.

use crate::imaging::{ImageBackend, RustBackend, ThumbnailConfig};
use crate::listing::{self, Entry, ListError};
use crate::paths::PathError;
use crate::roots::Roots;
use crate::thumbs::{Artifact, ThumbnailCache, ThumbnailError, ThumbnailMetadata};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    List(#[from] ListError),
    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),
}

impl LibraryError {
    /// True when the error is an invariant violation rather than a bad
    /// request.
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Path(e)
            | Self::List(ListError::Path(e))
            | Self::Thumbnail(ThumbnailError::Path(e)) => e.is_internal(),
            _ => false,
        }
    }
}

pub struct Library<B: ImageBackend = RustBackend> {
    roots: Arc<Roots>,
    cache: ThumbnailCache<B>,
}

impl Library<RustBackend> {
    pub fn new(roots: Arc<Roots>, config: ThumbnailConfig) -> Self {
        let cache = ThumbnailCache::new(Arc::clone(&roots), config);
        Self { roots, cache }
    }
}

impl<B: ImageBackend> Library<B> {
    /// Use a specific backend (allows testing with mock).
    pub fn with_backend(roots: Arc<Roots>, config: ThumbnailConfig, backend: B) -> Self {
        let cache = ThumbnailCache::with_backend(Arc::clone(&roots), config, backend);
        Self { roots, cache }
    }

    pub fn roots(&self) -> &Roots {
        &self.roots
    }

    pub fn cache(&self) -> &ThumbnailCache<B> {
        &self.cache
    }

    /// List a directory (or the single entry for a file) by virtual path.
    pub fn list(&self, virtual_path: &str) -> Result<Vec<Entry>, LibraryError> {
        if virtual_path == "/" {
            return Ok(self.list_aliases());
        }
        let absolute = self.roots.to_absolute(virtual_path)?;
        Ok(listing::list_entries(&self.roots, &absolute)?)
    }

    /// Absolute path behind a virtual path. Does not check that it exists.
    pub fn resolve(&self, virtual_path: &str) -> Result<PathBuf, LibraryError> {
        Ok(self.roots.to_absolute(virtual_path)?)
    }

    /// Thumbnail artifact for an image, generating it on first request.
    pub fn thumbnail(&self, virtual_path: &str) -> Result<Artifact, LibraryError> {
        let absolute = self.roots.to_absolute(virtual_path)?;
        Ok(self.cache.get_or_create(&absolute)?)
    }

    pub fn read_metadata(&self, artifact: &Artifact) -> Result<ThumbnailMetadata, LibraryError> {
        Ok(self.cache.read_metadata(artifact)?)
    }

    /// Thumbnail metadata for an image, generating it on first request.
    pub fn thumbnail_metadata(&self, virtual_path: &str) -> Result<ThumbnailMetadata, LibraryError> {
        let artifact = self.thumbnail(virtual_path)?;
        self.read_metadata(&artifact)
    }

    fn list_aliases(&self) -> Vec<Entry> {
        self.roots
            .aliases()
            .iter()
            .map(|alias| Entry {
                name: alias.prefix.trim_start_matches('/').to_string(),
                path: alias.prefix.clone(),
                size: std::fs::metadata(&alias.root).map(|m| m.len()).unwrap_or(0),
                is_dir: true,
                is_image: false,
            })
            .collect()
    }
}
