//! Thumbnail cache.
//!
//! Decoding and resizing a full-size photo is the slowest thing the server
//! does, so every thumbnail is produced once and then served from disk.
//!
//! # Design
//!
//! ## Cache keys
//!
//! The key is the md5 of the source's **absolute path text**, hex encoded
//! (32 chars). It does not look at file contents or modification times: a
//! photo edited in place keeps its old thumbnail until the cache directory
//! is cleared by hand. Nothing is ever evicted.
//!
//! ## Storage
//!
//! Each key owns two files in the cache directory:
//!
//! ```text
//! <cache>/
//! ├── 0cc175b9c0f1b6a831c399e269772661.jpg    # thumbnail, long edge ≤ 1200px
//! └── 0cc175b9c0f1b6a831c399e269772661.json   # metadata sidecar
//! ```
//!
//! The sidecar describes both images by virtual path:
//!
//! ```json
//! {
//!   "name": "a.jpg",
//!   "original": { "path": "/Bio/a.jpg", "width": 4000, "height": 3000 },
//!   "thumbnail": { "path": "/data/0cc1….jpg", "width": 1200, "height": 900 }
//! }
//! ```
//!
//! Both files are written to a temporary name inside the cache directory
//! and renamed into place, JPEG first, sidecar last. The sidecar's presence
//! is therefore the cache-hit signal: once it exists, the JPEG does too, and
//! neither is ever seen half-written.
//!
//! ## Concurrency
//!
//! Generation is single-flight per key. Concurrent requests for the same
//! uncached image queue on a per-key lock; the first one does the work and
//! the rest find the sidecar when they get the lock. Different keys never
//! wait on each other.

use crate::imaging::{
    BackendError, ImageBackend, RustBackend, ThumbnailConfig, create_thumbnail,
};
use crate::paths::PathError;
use crate::roots::Roots;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Metadata error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Imaging(#[from] BackendError),
    #[error(transparent)]
    Path(#[from] PathError),
}

/// One image as described in a sidecar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    /// Virtual path.
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// Contents of a `{key}.json` sidecar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThumbnailMetadata {
    /// Base file name of the source image.
    pub name: String,
    pub original: ImageRef,
    pub thumbnail: ImageRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from existing files.
    Hit,
    /// Decoded, resized and written by this call.
    Generated,
}

/// Result of [`ThumbnailCache::get_or_create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub key: String,
    pub metadata_path: PathBuf,
    pub thumbnail_path: PathBuf,
    pub status: CacheStatus,
}

/// md5 of the path's bytes, as 32 lowercase hex chars.
pub fn cache_key(source: &Path) -> String {
    let digest = Md5::digest(source.as_os_str().as_encoded_bytes());
    format!("{:x}", digest)
}

pub struct ThumbnailCache<B: ImageBackend = RustBackend> {
    roots: Arc<Roots>,
    config: ThumbnailConfig,
    backend: B,
    /// Per-key generation locks. An entry lives only while someone holds or
    /// waits on it.
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ThumbnailCache<RustBackend> {
    pub fn new(roots: Arc<Roots>, config: ThumbnailConfig) -> Self {
        Self::with_backend(roots, config, RustBackend::new())
    }
}

impl<B: ImageBackend> ThumbnailCache<B> {
    /// Use a specific backend (allows testing with mock).
    pub fn with_backend(roots: Arc<Roots>, config: ThumbnailConfig, backend: B) -> Self {
        Self {
            roots,
            config,
            backend,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        self.roots.cache_dir()
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn thumbnail_path(&self, key: &str) -> PathBuf {
        self.dir().join(format!("{key}.jpg"))
    }

    pub fn metadata_path(&self, key: &str) -> PathBuf {
        self.dir().join(format!("{key}.json"))
    }

    /// Return the cached thumbnail for `source`, generating it first if the
    /// cache has none.
    pub fn get_or_create(&self, source: &Path) -> Result<Artifact, ThumbnailError> {
        let key = cache_key(source);
        let artifact = |status| Artifact {
            metadata_path: self.metadata_path(&key),
            thumbnail_path: self.thumbnail_path(&key),
            key: key.clone(),
            status,
        };

        if self.metadata_path(&key).exists() {
            tracing::debug!(%key, source = %source.display(), "thumbnail cache hit");
            return Ok(artifact(CacheStatus::Hit));
        }

        let gate = self.acquire_gate(&key);
        let result = {
            let _held = gate.lock().unwrap_or_else(PoisonError::into_inner);
            if self.metadata_path(&key).exists() {
                Ok(CacheStatus::Hit)
            } else {
                self.generate(source, &key).map(|()| CacheStatus::Generated)
            }
        };
        self.release_gate(&key, gate);

        result.map(artifact)
    }

    /// Read and parse a sidecar.
    pub fn read_metadata(&self, artifact: &Artifact) -> Result<ThumbnailMetadata, ThumbnailError> {
        let content = std::fs::read_to_string(&artifact.metadata_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn generate(&self, source: &Path, key: &str) -> Result<(), ThumbnailError> {
        let started = std::time::Instant::now();
        let thumbnail_path = self.thumbnail_path(key);

        // Resolve virtual paths before any pixel work so an unmapped source
        // fails fast.
        let original_virtual = self.roots.to_virtual(source)?;
        let thumbnail_virtual = self.roots.to_virtual(&thumbnail_path)?;

        let staged = tempfile::Builder::new()
            .prefix(".")
            .suffix(".jpg.tmp")
            .tempfile_in(self.dir())?
            .into_temp_path();
        let rendered = create_thumbnail(&self.backend, source, &staged, &self.config)?;
        staged.persist(&thumbnail_path).map_err(|e| e.error)?;

        let metadata = ThumbnailMetadata {
            name: source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            original: ImageRef {
                path: original_virtual,
                width: rendered.original.width,
                height: rendered.original.height,
            },
            thumbnail: ImageRef {
                path: thumbnail_virtual,
                width: rendered.thumbnail.width,
                height: rendered.thumbnail.height,
            },
        };
        let mut sidecar = tempfile::Builder::new()
            .prefix(".")
            .suffix(".json.tmp")
            .tempfile_in(self.dir())?;
        sidecar.write_all(&serde_json::to_vec_pretty(&metadata)?)?;
        sidecar.flush()?;
        sidecar
            .persist(self.metadata_path(key))
            .map_err(|e| e.error)?;

        tracing::info!(
            %key,
            source = %source.display(),
            width = rendered.thumbnail.width,
            height = rendered.thumbnail.height,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "thumbnail generated"
        );
        Ok(())
    }

    fn acquire_gate(&self, key: &str) -> Arc<Mutex<()>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(in_flight.entry(key.to_string()).or_default())
    }

    /// Drop the caller's handle, removing the map entry if nobody else
    /// holds one. Handles are only cloned under the map lock, so the count
    /// cannot grow while we look at it.
    fn release_gate(&self, key: &str, gate: Arc<Mutex<()>>) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&gate) == 2 {
            in_flight.remove(key);
        }
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight.lock().unwrap().len()
    }
}
