//! Log browser file system abstraction layer
//!
//! Provides a unified interface over the backing stores a log directory can
//! contain, including:
//! - FileProvider: one trait over plain directories, zip and tar.gz archives
//! - ProviderResolver: ordered probing for the provider of a path
//! - ReverseLineReader: memory-bounded tailing of large text files
//! - PathGuard: containment of every request inside the base directory
//! - Encoding detection for legacy archive member names

mod browser;
mod encoding;
mod guard;
mod provider;
mod search;
mod tail;
mod vfs;

pub use browser::{
    decode_filename, encode_filename, is_archive_name, sort_entries, FileEntry, FileType,
    FilesystemProvider, SortBy,
};
pub use encoding::{decode_bytes, system_encoding_hint, EncodingHint};
pub use guard::PathGuard;
pub use provider::{FileProvider, ProviderResolver};
pub use search::scan_lines;
pub use tail::{tail_lines, write_lines, ReverseLineReader, DEFAULT_BLOCK_SIZE};
pub use vfs::{TarGzArchiveProvider, ZipArchiveProvider};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Coarse classification of [`FsError`], for callers that branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoProviderFound,
    PathTraversalRejected,
    MemberNotFound,
    IoFailure,
}

/// File system errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("No file provider found for {}", .0.display())]
    NoProviderFound(PathBuf),

    #[error("File {path} may not be located outside base path {}", .base.display())]
    PathTraversalRejected { path: String, base: PathBuf },

    #[error("Member {member} not found in {}", .container.display())]
    MemberNotFound { container: PathBuf, member: String },

    #[error("{op} failed for {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive error in {}: {message}", .path.display())]
    Archive { path: PathBuf, message: String },
}

impl FsError {
    /// Wrap an I/O error with the failed operation and the path it touched.
    ///
    /// Meant for `map_err`: `.map_err(FsError::io("open", &path))`
    pub fn io(op: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| FsError::Io { op, path, source }
    }

    pub(crate) fn archive(path: &Path, err: impl std::fmt::Display) -> Self {
        FsError::Archive {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NoProviderFound(_) => ErrorKind::NoProviderFound,
            FsError::PathTraversalRejected { .. } => ErrorKind::PathTraversalRejected,
            FsError::MemberNotFound { .. } => ErrorKind::MemberNotFound,
            FsError::Io { .. } | FsError::Archive { .. } => ErrorKind::IoFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
