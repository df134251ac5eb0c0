//! End-to-end tests through the public API: alias file on disk, real image
//! files, real JPEG encoding.

use phototree::imaging::ThumbnailConfig;
use phototree::library::{Library, LibraryError};
use phototree::paths::PathError;
use phototree::roots::resolve_roots;
use phototree::thumbs::ThumbnailMetadata;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

fn write_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_fn(width, height, |x, _| image::Rgb([0, (x % 256) as u8, 0]));
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// `My Bio/{a.jpg, b.png, notes.txt, sub/}` registered as `/Bio` through a
/// JSON alias file.
fn bio_library(tmp: &TempDir) -> (Library, PathBuf) {
    let bio = tmp.path().join("My Bio");
    fs::create_dir_all(bio.join("sub")).unwrap();
    write_jpeg(&bio.join("a.jpg"), 2400, 1600);
    write_png(&bio.join("b.png"), 640, 480);
    fs::write(bio.join("notes.txt"), "todo").unwrap();

    let alias_file = tmp.path().join("roots.json");
    fs::write(
        &alias_file,
        serde_json::json!({ "/Bio": bio }).to_string(),
    )
    .unwrap();

    let roots = resolve_roots(&alias_file, &tmp.path().join("cache")).unwrap();
    let cache_dir = roots.cache_dir().to_path_buf();
    (
        Library::new(Arc::new(roots), ThumbnailConfig::default()),
        cache_dir,
    )
}

#[test]
fn listing_bio_skips_non_images() {
    let tmp = TempDir::new().unwrap();
    let (library, _) = bio_library(&tmp);

    let mut entries = library.list("/Bio").unwrap();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let summary: Vec<(&str, &str, bool, bool)> = entries
        .iter()
        .map(|e| (e.name.as_str(), e.path.as_str(), e.is_dir, e.is_image))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("a.jpg", "/Bio/a.jpg", false, true),
            ("b.png", "/Bio/b.png", false, true),
            ("sub", "/Bio/sub", true, false),
        ]
    );
}

#[test]
fn listing_root_shows_aliases() {
    let tmp = TempDir::new().unwrap();
    let (library, _) = bio_library(&tmp);

    let entries = library.list("/").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "/Bio");
}

#[test]
fn concurrent_thumbnail_requests_agree() {
    let tmp = TempDir::new().unwrap();
    let (library, cache_dir) = bio_library(&tmp);

    let results: Vec<ThumbnailMetadata> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| s.spawn(|| library.thumbnail_metadata("/Bio/a.jpg").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results[0], results[1]);
    let metadata = &results[0];
    assert_eq!(metadata.name, "a.jpg");
    assert_eq!(metadata.original.path, "/Bio/a.jpg");
    assert_eq!((metadata.original.width, metadata.original.height), (2400, 1600));
    assert_eq!((metadata.thumbnail.width, metadata.thumbnail.height), (1200, 800));

    // The thumbnail decodes in full and the cache holds nothing else.
    let thumb_path = library.resolve(&metadata.thumbnail.path).unwrap();
    let decoded = image::open(&thumb_path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1200, 800));

    let mut names: Vec<String> = fs::read_dir(&cache_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert!(names[0].ends_with(".jpg") && names[1].ends_with(".json"));
}

#[test]
fn second_thumbnail_request_leaves_files_untouched() {
    let tmp = TempDir::new().unwrap();
    let (library, _) = bio_library(&tmp);

    let first = library.thumbnail("/Bio/b.png").unwrap();
    let jpeg = fs::read(&first.thumbnail_path).unwrap();
    let json = fs::read(&first.metadata_path).unwrap();

    let second = library.thumbnail("/Bio/b.png").unwrap();
    assert_eq!(fs::read(&second.thumbnail_path).unwrap(), jpeg);
    assert_eq!(fs::read(&second.metadata_path).unwrap(), json);

    // Smaller than max_edge: kept at its own size.
    let metadata = library.read_metadata(&second).unwrap();
    assert_eq!((metadata.thumbnail.width, metadata.thumbnail.height), (640, 480));
}

#[test]
fn virtual_paths_round_trip() {
    let tmp = TempDir::new().unwrap();
    let (library, _) = bio_library(&tmp);
    let roots = library.roots();

    for virtual_path in ["/Bio/a.jpg", "/Bio/sub/deep/x.png", "/data/abc.json"] {
        let absolute = roots.to_absolute(virtual_path).unwrap();
        assert_eq!(roots.to_virtual(&absolute).unwrap(), virtual_path);
    }
}

#[test]
fn unknown_and_traversing_paths_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let (library, _) = bio_library(&tmp);

    for virtual_path in ["/Biography/a.jpg", "/Travel", "Bio/a.jpg", "/Bio/../roots.json"] {
        assert!(
            matches!(
                library.resolve(virtual_path),
                Err(LibraryError::Path(PathError::InvalidPath(_)))
            ),
            "{virtual_path:?} should be rejected"
        );
    }
}
