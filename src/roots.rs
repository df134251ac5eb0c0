//! Alias registry: virtual root names mapped to directories on disk.
//!
//! Built once at startup from a single CLI argument and never mutated
//! afterwards. The argument is either:
//!
//! - **a directory**: one alias is synthesized from its base name
//!   (`/photos/My Bio` → `/My Bio`), or
//! - **a JSON file** holding an object of alias → directory:
//!
//! ```json
//! { "Bio": "/home/me/Pictures/My Bio", "/Travel": "/mnt/archive/travel" }
//! ```
//!
//! Keys are normalized to start with `/`. On top of the user aliases the
//! registry always carries [`CACHE_PREFIX`], which maps to the thumbnail
//! cache directory so cached files can be addressed like any other path.
//!
//! Lookups go through two explicitly ordered lists (longest virtual prefix
//! first, deepest root first), so overlapping aliases resolve the same way
//! on every run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Virtual prefix reserved for the thumbnail cache directory.
pub const CACHE_PREFIX: &str = "/data";

#[derive(Error, Debug)]
pub enum RootsError {
    #[error("Cannot read root config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Root config {} is neither a directory nor a JSON object of alias to directory: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Alias {alias} points to {}, which is not a usable directory", path.display())]
    NotADirectory { alias: String, path: PathBuf },
    #[error("Invalid alias name: {0:?}")]
    InvalidAlias(String),
    #[error("Duplicate alias: {0}")]
    DuplicateAlias(String),
    #[error("Aliases {first} and {second} share the root {}", root.display())]
    SharedRoot {
        first: String,
        second: String,
        root: PathBuf,
    },
    #[error("Alias {0} points at the thumbnail cache directory")]
    RootIsCache(String),
    #[error("Alias {0} collides with the reserved cache prefix")]
    Reserved(String),
    #[error("Cache directory {} is not writable: {source}", path.display())]
    CacheDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One virtual prefix and the directory it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// Always starts with `/`, never ends with one.
    pub prefix: String,
    pub root: PathBuf,
}

impl Alias {
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            root: root.into(),
        }
    }
}

/// The immutable registry. Share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Roots {
    /// User aliases in the order given to [`Roots::new`].
    aliases: Vec<Alias>,
    cache_dir: PathBuf,
    /// User aliases plus the cache alias, longest prefix first.
    by_prefix: Vec<Alias>,
    /// Same set, deepest root first.
    by_root: Vec<Alias>,
}

impl Roots {
    /// Build a registry from already-resolved aliases.
    ///
    /// Prefixes are normalized; duplicates and collisions with
    /// [`CACHE_PREFIX`] are rejected. Each root backs at most one alias and
    /// none may be the cache directory, so every absolute path maps back to
    /// the alias it came from. No filesystem access happens here.
    pub fn new(aliases: Vec<Alias>, cache_dir: PathBuf) -> Result<Self, RootsError> {
        let mut normalized: Vec<Alias> = Vec::with_capacity(aliases.len());
        for alias in aliases {
            let prefix = normalize_prefix(&alias.prefix)?;
            if prefix == CACHE_PREFIX {
                return Err(RootsError::Reserved(prefix));
            }
            if normalized.iter().any(|a| a.prefix == prefix) {
                return Err(RootsError::DuplicateAlias(prefix));
            }
            if alias.root == cache_dir {
                return Err(RootsError::RootIsCache(prefix));
            }
            if let Some(other) = normalized.iter().find(|a| a.root == alias.root) {
                return Err(RootsError::SharedRoot {
                    first: other.prefix.clone(),
                    second: prefix,
                    root: alias.root,
                });
            }
            normalized.push(Alias::new(prefix, alias.root));
        }

        let mut by_prefix = normalized.clone();
        by_prefix.push(Alias::new(CACHE_PREFIX, cache_dir.clone()));
        let mut by_root = by_prefix.clone();

        by_prefix.sort_by(|a, b| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then_with(|| a.prefix.cmp(&b.prefix))
        });
        by_root.sort_by(|a, b| {
            b.root
                .components()
                .count()
                .cmp(&a.root.components().count())
                .then_with(|| a.prefix.cmp(&b.prefix))
        });

        Ok(Self {
            aliases: normalized,
            cache_dir,
            by_prefix,
            by_root,
        })
    }

    /// User aliases in the order they were given. Excludes the cache alias.
    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// All aliases (cache included), longest virtual prefix first.
    pub(crate) fn by_prefix(&self) -> &[Alias] {
        &self.by_prefix
    }

    /// All aliases (cache included), deepest absolute root first.
    pub(crate) fn by_root(&self) -> &[Alias] {
        &self.by_root
    }
}

/// Normalize an alias key: leading `/` added, trailing `/` removed.
///
/// Rejects keys that end up empty or `/` (they would shadow every path)
/// and keys containing `.` or `..` segments.
pub fn normalize_prefix(key: &str) -> Result<String, RootsError> {
    let trimmed = key.trim().trim_end_matches('/');
    let prefix = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };

    let bad_segment = prefix
        .split('/')
        .skip(1)
        .any(|s| s.is_empty() || s == "." || s == "..");
    if prefix == "/" || bad_segment {
        return Err(RootsError::InvalidAlias(key.to_string()));
    }
    Ok(prefix)
}

/// Resolve the roots argument into a registry.
///
/// `cache_dir` is created if missing and probed for writability; every
/// configured root must be an existing directory. All paths are
/// canonicalized so cache keys do not depend on how a root was spelled.
/// Aliases from a JSON file come out sorted by key.
pub fn resolve_roots(arg: &Path, cache_dir: &Path) -> Result<Roots, RootsError> {
    let cache_dir = prepare_cache_dir(cache_dir)?;

    let aliases = if arg.is_dir() {
        let root = canonical_dir(arg, &arg.display().to_string())?;
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| RootsError::InvalidAlias(root.display().to_string()))?;
        vec![Alias::new(format!("/{name}"), root)]
    } else {
        let content = std::fs::read_to_string(arg).map_err(|source| RootsError::Read {
            path: arg.to_path_buf(),
            source,
        })?;
        let mapping: BTreeMap<String, PathBuf> =
            serde_json::from_str(&content).map_err(|source| RootsError::Json {
                path: arg.to_path_buf(),
                source,
            })?;
        mapping
            .into_iter()
            .map(|(key, dir)| {
                let root = canonical_dir(&dir, &key)?;
                Ok::<_, RootsError>(Alias::new(key, root))
            })
            .collect::<Result<Vec<_>, RootsError>>()?
    };

    Roots::new(aliases, cache_dir)
}

fn canonical_dir(path: &Path, alias: &str) -> Result<PathBuf, RootsError> {
    let not_a_dir = || RootsError::NotADirectory {
        alias: alias.to_string(),
        path: path.to_path_buf(),
    };
    let canonical = path.canonicalize().map_err(|_| not_a_dir())?;
    if canonical.is_dir() {
        Ok(canonical)
    } else {
        Err(not_a_dir())
    }
}

/// Create the cache directory and make sure we can write into it.
fn prepare_cache_dir(dir: &Path) -> Result<PathBuf, RootsError> {
    let cache_err = |source: std::io::Error| RootsError::CacheDir {
        path: dir.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(cache_err)?;
    tempfile::tempfile_in(dir).map_err(cache_err)?;
    dir.canonicalize().map_err(cache_err)
}
