//! Shared test utilities for the phototree test suite.
//!
//! Synthesizes small JPEG/PNG files with the `image` encoders and builds the
//! standard "Bio" fixture used across modules:
//!
//! ```text
//! <tmp>/
//! ├── My Bio/          # aliased as /Bio
//! │   ├── a.jpg        # 1600x1200
//! │   ├── b.png        # 300x500, RGBA
//! │   ├── notes.txt
//! │   └── sub/
//! └── cache/           # reserved /data alias
//! ```

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crate::roots::{Alias, Roots};

// =========================================================================
// Image files
// =========================================================================

/// Create a valid JPEG file with a gradient pattern.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

/// Create a valid RGBA PNG file (alpha exercises the JPEG flattening path).
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, 64, (y % 256) as u8, 200])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

// =========================================================================
// Fixture setup
// =========================================================================

/// The Bio fixture: returns the temp dir (keep it alive) and its registry.
pub fn setup_bio_fixture() -> (TempDir, Arc<Roots>) {
    let tmp = TempDir::new().unwrap();
    let bio = tmp.path().join("My Bio");
    let cache = tmp.path().join("cache");
    std::fs::create_dir_all(bio.join("sub")).unwrap();
    std::fs::create_dir_all(&cache).unwrap();

    create_test_jpeg(&bio.join("a.jpg"), 1600, 1200);
    create_test_png(&bio.join("b.png"), 300, 500);
    std::fs::write(bio.join("notes.txt"), "not an image").unwrap();

    let roots = Roots::new(
        vec![Alias::new("/Bio", bio.canonicalize().unwrap())],
        cache.canonicalize().unwrap(),
    )
    .unwrap();
    (tmp, Arc::new(roots))
}

/// Names of the entries in a listing, sorted for order-independent asserts.
pub fn sorted_names(entries: &[crate::listing::Entry]) -> Vec<&str> {
    let mut names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    names.sort();
    names
}
