//! # phototree
//!
//! Serves a tree of local photo collections over HTTP: directory listings,
//! original files, and resized thumbnails with metadata.
//!
//! # Architecture: Virtual Paths Over Real Directories
//!
//! Clients never see a filesystem path. Each collection root is registered
//! under an alias, and every request names a **virtual path** below one:
//!
//! ```text
//! /Bio/2019/a.jpg   →  /home/me/My Bio/2019/a.jpg      (user alias)
//! /data/<key>.jpg   →  ~/.phototree/thumbs/<key>.jpg   (reserved cache alias)
//! ```
//!
//! A request flows through the same few steps whatever the route:
//!
//! ```text
//! virtual path → paths::to_absolute → listing / thumbs → paths::to_virtual → JSON
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`roots`] | Alias registry: builds the immutable prefix → directory table from a directory or JSON file |
//! | [`paths`] | Virtual ↔ absolute translation, segment-boundary matching, traversal rejection |
//! | [`listing`] | Immediate children of a directory, classified as directory or image |
//! | [`imaging`] | Decode, fit-resize and JPEG-encode behind the [`imaging::ImageBackend`] trait |
//! | [`thumbs`] | Path-keyed thumbnail cache with metadata sidecars and single-flight generation |
//! | [`library`] | Virtual-path API tying the registry, lister and cache together |
//! | [`server`] | axum routes `/ls`, `/get`, `/download`, `/thumb`, `/health` |
//! | [`warm`] | Parallel pre-generation of every thumbnail under all roots |
//! | [`config`] | TOML server configuration: loading, validation, stock file |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Thumbnails Keyed by Path
//!
//! A thumbnail's cache key is the md5 of its source's absolute path, not of
//! its bytes. Looking one up costs a single `stat` of the sidecar. A photo
//! edited in place keeps its old thumbnail until the cache directory is
//! cleared; see [`thumbs`].
//!
//! ## No Global State
//!
//! The registry is built once at startup and handed around explicitly
//! inside an `Arc`. Nothing else is shared between requests except the
//! cache's per-key generation locks.
//!
//! ## Traversal
//!
//! `..` segments in a virtual path are rejected, and prefixes only match at
//! a `/` boundary, so the path a virtual path resolves to is lexically
//! inside the root its alias names. Symlinks below a root are not checked:
//! `/get` follows them like any other file.

pub mod config;
pub mod imaging;
pub mod library;
pub mod listing;
pub mod output;
pub mod paths;
pub mod roots;
pub mod server;
pub mod thumbs;
pub mod warm;

#[cfg(test)]
pub(crate) mod test_helpers;
