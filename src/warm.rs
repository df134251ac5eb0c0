//! Offline thumbnail pre-generation.
//!
//! `phototree warm` walks every user root, picks out images with the same
//! name rule the lister uses, and runs each one through the thumbnail cache
//! in parallel with [rayon](https://docs.rs/rayon). Afterwards the server
//! answers every `/thumb` request from disk.
//!
//! Images already cached are hits and cost one `stat`. A failing image is
//! reported and counted; it never stops the run.
//!
//! Progress is streamed as [`WarmEvent`]s over an optional channel so the
//! CLI can print while workers are still busy.

use crate::imaging::ImageBackend;
use crate::library::Library;
use crate::listing::is_image_name;
use crate::thumbs::CacheStatus;
use rayon::prelude::*;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::sync::mpsc::Sender;
use walkdir::WalkDir;

/// Progress report for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarmEvent {
    Hit { path: String },
    Generated { path: String },
    Failed { path: String, error: String },
}

/// Totals for a warm run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WarmStats {
    pub hits: u32,
    pub generated: u32,
    pub failed: u32,
}

impl WarmStats {
    pub fn total(&self) -> u32 {
        self.hits + self.generated + self.failed
    }

    fn record(&mut self, event: &WarmEvent) {
        match event {
            WarmEvent::Hit { .. } => self.hits += 1,
            WarmEvent::Generated { .. } => self.generated += 1,
            WarmEvent::Failed { .. } => self.failed += 1,
        }
    }
}

impl fmt::Display for WarmStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cached, {} generated", self.hits, self.generated)?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        write!(f, " ({} total)", self.total())
    }
}

/// Every image under the user roots, as virtual paths, in walk order.
///
/// Unreadable directories are logged and skipped. Symlinks are not
/// followed. The cache directory is never entered, even when it lives
/// under a root.
pub fn collect_images<B: ImageBackend>(library: &Library<B>) -> Vec<String> {
    let roots = library.roots();
    let cache_dir = roots.cache_dir();
    let mut images = Vec::new();
    for alias in roots.aliases() {
        let walk = WalkDir::new(&alias.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.path() != cache_dir);
        for entry in walk {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(root = %alias.root.display(), error = %e, "skipping unreadable path");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_image_name(&entry.file_name().to_string_lossy()) {
                continue;
            }
            match roots.to_virtual(entry.path()) {
                Ok(path) => images.push(path),
                Err(e) => tracing::error!(error = %e, "walked outside the registered roots"),
            }
        }
    }
    images
}

/// Generate thumbnails for every image under every root.
pub fn warm<B: ImageBackend>(library: &Library<B>, events: Option<Sender<WarmEvent>>) -> WarmStats {
    let images = collect_images(library);
    tracing::info!(count = images.len(), "warming thumbnail cache");

    let stats = Mutex::new(WarmStats::default());

    images.par_iter().for_each(|path| {
        let event = match library.thumbnail(path) {
            Ok(artifact) => match artifact.status {
                CacheStatus::Hit => WarmEvent::Hit { path: path.clone() },
                CacheStatus::Generated => WarmEvent::Generated { path: path.clone() },
            },
            Err(e) => {
                tracing::warn!(%path, error = %e, "thumbnail failed");
                WarmEvent::Failed {
                    path: path.clone(),
                    error: e.to_string(),
                }
            }
        };
        stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(&event);
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    });

    stats
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ThumbnailConfig;
    use crate::imaging::backend::tests::MockBackend;
    use crate::roots::{Alias, Roots};
    use crate::test_helpers::{create_test_jpeg, setup_bio_fixture};
    use std::fs;
    use std::sync::Arc;

    fn mock_library(roots: Arc<Roots>) -> Library<MockBackend> {
        Library::with_backend(roots, ThumbnailConfig::default(), MockBackend::new())
    }

    // =========================================================================
    // collect_images
    // =========================================================================

    #[test]
    fn collect_finds_nested_images_only() {
        let (_tmp, roots) = setup_bio_fixture();
        let root = roots.aliases()[0].root.clone();
        fs::write(root.join("sub").join("c.jpeg"), b"x").unwrap();
        fs::write(root.join("sub").join("d.PNG"), b"x").unwrap();
        let library = mock_library(roots);

        let images = collect_images(&library);
        assert_eq!(images, vec!["/Bio/a.jpg", "/Bio/b.png", "/Bio/sub/c.jpeg"]);
    }

    /// `me/{pics/a.jpg, .phototree/thumbs/}` with the cache inside the root.
    fn cache_under_root() -> (tempfile::TempDir, Library<MockBackend>) {
        let tmp = tempfile::TempDir::new().unwrap();
        let me = tmp.path().join("me");
        let cache = me.join(".phototree").join("thumbs");
        fs::create_dir_all(me.join("pics")).unwrap();
        fs::create_dir_all(&cache).unwrap();
        create_test_jpeg(&me.join("pics").join("a.jpg"), 40, 30);

        let roots = Roots::new(
            vec![Alias::new("/me", me.canonicalize().unwrap())],
            cache.canonicalize().unwrap(),
        )
        .unwrap();
        (tmp, mock_library(Arc::new(roots)))
    }

    #[test]
    fn collect_skips_cache_dir_inside_root() {
        let (_tmp, library) = cache_under_root();
        library.thumbnail("/me/pics/a.jpg").unwrap();

        assert_eq!(collect_images(&library), vec!["/me/pics/a.jpg"]);
    }

    #[test]
    fn repeated_warm_does_not_grow_cache_inside_root() {
        let (_tmp, library) = cache_under_root();

        for _ in 0..3 {
            warm(&library, None);
        }

        let stats = warm(&library, None);
        assert_eq!(
            stats,
            WarmStats {
                hits: 1,
                generated: 0,
                failed: 0
            }
        );
        assert_eq!(fs::read_dir(library.roots().cache_dir()).unwrap().count(), 2);
        assert_eq!(library.cache().backend().get_operations().len(), 1);
    }

    // =========================================================================
    // warm
    // =========================================================================

    #[test]
    fn warm_generates_then_hits() {
        let (_tmp, roots) = setup_bio_fixture();
        let library = mock_library(roots);

        let first = warm(&library, None);
        assert_eq!(
            first,
            WarmStats {
                hits: 0,
                generated: 2,
                failed: 0
            }
        );

        let second = warm(&library, None);
        assert_eq!(
            second,
            WarmStats {
                hits: 2,
                generated: 0,
                failed: 0
            }
        );
        assert_eq!(library.cache().backend().get_operations().len(), 2);
    }

    #[test]
    fn warm_sends_one_event_per_image() {
        let (_tmp, roots) = setup_bio_fixture();
        let library = mock_library(roots);
        let (tx, rx) = std::sync::mpsc::channel();

        let stats = warm(&library, Some(tx));
        let mut events: Vec<WarmEvent> = rx.iter().collect();
        events.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));

        assert_eq!(stats.total(), 2);
        assert_eq!(
            events,
            vec![
                WarmEvent::Generated {
                    path: "/Bio/a.jpg".into()
                },
                WarmEvent::Generated {
                    path: "/Bio/b.png".into()
                },
            ]
        );
    }

    #[test]
    fn warm_continues_past_failures() {
        let (_tmp, roots) = setup_bio_fixture();
        fs::write(roots.aliases()[0].root.join("broken.jpg"), b"not a jpeg").unwrap();
        let library = Library::new(roots, ThumbnailConfig::default());

        let stats = warm(&library, None);
        assert_eq!(stats.generated, 2);
        assert_eq!(stats.failed, 1);
    }

    // =========================================================================
    // WarmStats
    // =========================================================================

    #[test]
    fn stats_display() {
        let stats = WarmStats {
            hits: 3,
            generated: 2,
            failed: 0,
        };
        assert_eq!(stats.to_string(), "3 cached, 2 generated (5 total)");

        let stats = WarmStats {
            hits: 0,
            generated: 1,
            failed: 2,
        };
        assert_eq!(stats.to_string(), "0 cached, 1 generated, 2 failed (3 total)");
    }
}
