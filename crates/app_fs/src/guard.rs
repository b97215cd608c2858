//! Path containment for every caller-supplied path
//!
//! Targets inside an archive do not exist on disk, so canonicalization
//! resolves the longest existing prefix through the filesystem and
//! normalizes the remaining components lexically.

use crate::{FsError, Result};
use std::path::{Component, Path, PathBuf};

/// Keeps requests inside the configured base directory
#[derive(Debug, Clone)]
pub struct PathGuard {
    base: PathBuf,
    canonical_base: PathBuf,
}

impl PathGuard {
    /// Create a guard for `base`, which must exist
    pub fn new<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let canonical_base = base
            .canonicalize()
            .map_err(FsError::io("canonicalize", &base))?;

        Ok(Self {
            base,
            canonical_base,
        })
    }

    /// The base directory as configured
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn canonical_base(&self) -> &Path {
        &self.canonical_base
    }

    /// Join a caller-supplied relative folder onto the base.
    ///
    /// Leading separators are ignored so `/sub` and `sub` name the same
    /// folder. No containment check happens here; see [`PathGuard::check`].
    pub fn folder(&self, relative: Option<&str>) -> PathBuf {
        match relative.map(|r| r.trim_start_matches(['/', '\\'])) {
            Some(r) if !r.is_empty() => self.base.join(r),
            _ => self.base.clone(),
        }
    }

    /// Verify that `folder` (joined with `filename`, when given) stays inside
    /// the base directory, returning the canonical target
    pub fn check(&self, folder: &Path, filename: Option<&str>) -> Result<PathBuf> {
        let target = match filename {
            Some(name) => folder.join(name),
            None => folder.to_path_buf(),
        };

        let canonical = canonicalize_lenient(&target)
            .map_err(FsError::io("canonicalize", &target))?;

        if canonical.starts_with(&self.canonical_base) {
            Ok(canonical)
        } else {
            tracing::warn!(
                target = %target.display(),
                resolved = %canonical.display(),
                "Rejected path outside base directory"
            );
            Err(FsError::PathTraversalRejected {
                path: target.display().to_string(),
                base: self.base.clone(),
            })
        }
    }
}

/// Canonicalize the longest existing prefix of `path`, then apply the
/// remaining components lexically
fn canonicalize_lenient(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let components: Vec<Component<'_>> = absolute.components().collect();

    for split in (1..=components.len()).rev() {
        let prefix: PathBuf = components[..split].iter().collect();
        if let Ok(mut resolved) = prefix.canonicalize() {
            for component in &components[split..] {
                match component {
                    Component::ParentDir => {
                        resolved.pop();
                    }
                    Component::CurDir => {}
                    other => resolved.push(other.as_os_str()),
                }
            }
            return Ok(resolved);
        }
    }

    // Not even the root resolved; fall back to the lexical form
    Ok(absolute)
}
