//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Roots (printed by every command at startup)
//!
//! ```text
//! Roots
//! 001 /Bio
//!     Source: /home/me/My Bio
//! Cache (/data)
//!     /home/me/.phototree/thumbs
//! ```
//!
//! ## Listing
//!
//! ```text
//! /Bio
//!     001 sub/
//!     002 a.jpg (1.2 MB)
//! ```
//!
//! ## Thumbnail
//!
//! ```text
//! a.jpg (cached)
//!     Original: /Bio/a.jpg 4000x3000
//!     Thumbnail: /data/0cc1….jpg 1200x900
//! ```
//!
//! ## Warm
//!
//! ```text
//! /Bio/a.jpg: cached
//! /Bio/b.png: generated
//! /Bio/broken.jpg: failed
//!     Image decode error: …
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::listing::Entry;
use crate::roots::{CACHE_PREFIX, Roots};
use crate::thumbs::{CacheStatus, ThumbnailMetadata};
use crate::warm::WarmEvent;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte size with one decimal above a kilobyte.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

// ============================================================================
// Roots
// ============================================================================

pub fn format_roots(roots: &Roots) -> Vec<String> {
    let mut lines = vec!["Roots".to_string()];
    for (i, alias) in roots.aliases().iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), alias.prefix));
        lines.push(format!("{}Source: {}", indent(1), alias.root.display()));
    }
    lines.push(format!("Cache ({})", CACHE_PREFIX));
    lines.push(format!("{}{}", indent(1), roots.cache_dir().display()));
    lines
}

pub fn print_roots(roots: &Roots) {
    for line in format_roots(roots) {
        println!("{}", line);
    }
}

// ============================================================================
// Listing
// ============================================================================

/// Format a listing under its virtual path header. Directories carry a
/// trailing `/`, images their size.
pub fn format_listing(virtual_path: &str, entries: &[Entry]) -> Vec<String> {
    let mut lines = vec![virtual_path.to_string()];
    if entries.is_empty() {
        lines.push(format!("{}(empty)", indent(1)));
    }
    for (i, entry) in entries.iter().enumerate() {
        let label = if entry.is_dir {
            format!("{}/", entry.name)
        } else {
            format!("{} ({})", entry.name, format_size(entry.size))
        };
        lines.push(format!("{}{} {}", indent(1), format_index(i + 1), label));
    }
    lines
}

pub fn print_listing(virtual_path: &str, entries: &[Entry]) {
    for line in format_listing(virtual_path, entries) {
        println!("{}", line);
    }
}

// ============================================================================
// Thumbnail
// ============================================================================

pub fn format_metadata(metadata: &ThumbnailMetadata, status: CacheStatus) -> Vec<String> {
    let status = match status {
        CacheStatus::Hit => "cached",
        CacheStatus::Generated => "generated",
    };
    vec![
        format!("{} ({})", metadata.name, status),
        format!(
            "{}Original: {} {}x{}",
            indent(1),
            metadata.original.path,
            metadata.original.width,
            metadata.original.height
        ),
        format!(
            "{}Thumbnail: {} {}x{}",
            indent(1),
            metadata.thumbnail.path,
            metadata.thumbnail.width,
            metadata.thumbnail.height
        ),
    ]
}

pub fn print_metadata(metadata: &ThumbnailMetadata, status: CacheStatus) {
    for line in format_metadata(metadata, status) {
        println!("{}", line);
    }
}

// ============================================================================
// Warm
// ============================================================================

/// Format a single warm progress event as display lines.
pub fn format_warm_event(event: &WarmEvent) -> Vec<String> {
    match event {
        WarmEvent::Hit { path } => vec![format!("{}: cached", path)],
        WarmEvent::Generated { path } => vec![format!("{}: generated", path)],
        WarmEvent::Failed { path, error } => vec![
            format!("{}: failed", path),
            format!("{}{}", indent(1), error),
        ],
    }
}
