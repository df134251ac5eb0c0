//! Translation between virtual paths and absolute filesystem paths.
//!
//! Clients only ever see virtual paths (`/Bio/2019/a.jpg`); every I/O call
//! uses the absolute path behind it. Both directions are pure string/path
//! prefix substitution over the [`Roots`] registry, and this is the one place
//! where path traversal is checked.
//!
//! ## Matching rules
//!
//! - A prefix matches only at a segment boundary: `/Bio` matches `/Bio` and
//!   `/Bio/x`, never `/Biography`.
//! - When several prefixes match, the longest one wins.
//! - `..` segments are rejected outright; empty and `.` segments are dropped.
//!
//! [`Roots::to_virtual`] only sees paths the system produced itself, so a
//! miss there is reported as [`PathError::Unmapped`], an internal invariant
//! violation kept distinct from the user-facing [`PathError::InvalidPath`].

use crate::roots::Roots;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Internal error: {} is outside every registered root", .0.display())]
    Unmapped(PathBuf),
}

impl PathError {
    /// True for invariant violations, which are not the client's fault.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Unmapped(_))
    }
}

impl Roots {
    /// Translate a client-supplied virtual path into an absolute path.
    pub fn to_absolute(&self, virtual_path: &str) -> Result<PathBuf, PathError> {
        let invalid = || PathError::InvalidPath(virtual_path.to_string());
        if !virtual_path.starts_with('/') {
            return Err(invalid());
        }

        let (alias, rest) = self
            .by_prefix()
            .iter()
            .find_map(|alias| strip_alias(virtual_path, &alias.prefix).map(|rest| (alias, rest)))
            .ok_or_else(invalid)?;

        let mut path = alias.root.clone();
        for segment in rest.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(invalid()),
                name => path.push(name),
            }
        }
        Ok(path)
    }

    /// Translate an absolute path produced by the system back to its
    /// virtual form.
    pub fn to_virtual(&self, absolute: &Path) -> Result<String, PathError> {
        for alias in self.by_root() {
            let Ok(relative) = absolute.strip_prefix(&alias.root) else {
                continue;
            };
            let mut virtual_path = alias.prefix.clone();
            for component in relative.components() {
                if let Component::Normal(name) = component {
                    virtual_path.push('/');
                    virtual_path.push_str(&name.to_string_lossy());
                }
            }
            return Ok(virtual_path);
        }
        Err(PathError::Unmapped(absolute.to_path_buf()))
    }
}

/// Remainder of `virtual_path` after `prefix`, if the prefix matches at a
/// segment boundary.
fn strip_alias<'a>(virtual_path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = virtual_path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}
