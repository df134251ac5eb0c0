//! Directory listing.
//!
//! Lists the immediate children of a directory, keeping only
//! subdirectories and images. Kind detection is by file name only: a child
//! is an image when its name ends in `.jpg`, `.jpeg` or `.png`, matched
//! case-sensitively (`photo.PNG` is not an image). Everything else is
//! silently left out.
//!
//! A child that cannot be stat'ed is logged and skipped so one bad entry
//! never hides the rest of the directory. Results come back in filesystem
//! enumeration order.

use crate::paths::PathError;
use crate::roots::Roots;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Path(#[from] PathError),
}

/// One listing record, serialized with the camelCase keys clients expect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    /// Virtual path.
    pub path: String,
    pub size: u64,
    pub is_dir: bool,
    pub is_image: bool,
}

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Whether a file name has one of the [`IMAGE_EXTENSIONS`] (case-sensitive).
pub fn is_image_name(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext))
}

/// Classify a single path.
///
/// Directories and images yield an [`Entry`]; any other file kind yields
/// `None`. Symlinks are followed.
pub fn classify(roots: &Roots, path: &Path) -> Result<Option<Entry>, ListError> {
    let meta = fs::metadata(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (is_dir, is_image) = if meta.is_dir() {
        (true, false)
    } else if is_image_name(&name) {
        (false, true)
    } else {
        return Ok(None);
    };

    Ok(Some(Entry {
        path: roots.to_virtual(path)?,
        name,
        size: meta.len(),
        is_dir,
        is_image,
    }))
}

/// List a directory's children, or the single entry if `path` is a file.
pub fn list_entries(roots: &Roots, path: &Path) -> Result<Vec<Entry>, ListError> {
    let meta = fs::metadata(path)?;
    if !meta.is_dir() {
        return Ok(classify(roots, path)?.into_iter().collect());
    }

    let mut entries = Vec::new();
    for child in fs::read_dir(path)? {
        let child_path = match child {
            Ok(child) => child.path(),
            Err(e) => {
                tracing::warn!(dir = %path.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        match classify(roots, &child_path) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(path = %child_path.display(), error = %e, "skipping entry");
            }
        }
    }
    Ok(entries)
}
