//! Browse, view and search façade over the file providers
//!
//! Every entry point that takes a caller-supplied path runs it through the
//! [`PathGuard`] before a provider is asked to read anything.

use crate::{AppConfig, Result};
use app_fs::{
    encode_filename, scan_lines, sort_entries, FileEntry, FileType, FsError, PathGuard,
    ProviderResolver, SortBy,
};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Content type of everything written by [`LogView::view`] and [`LogView::search`]
pub const CONTENT_TYPE: &str = "text/plain";

/// A sorted folder listing plus the state a listing page needs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub files: Vec<FileEntry>,
    pub sort_by: Option<SortBy>,
    pub desc: bool,
    /// Canonical absolute path of the listed folder
    pub current_folder: String,
    /// The requested folder, percent-encoded; empty at the base
    pub base: String,
    /// Parent folder relative to the base; empty at the base
    pub parent: String,
    pub stylesheets: Vec<String>,
}

/// Parameters of a single view request
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewOptions<'a> {
    /// Folder or archive relative to the base
    pub base: Option<&'a str>,
    /// Tail this many lines instead of streaming the whole file
    pub tail_lines: Option<i64>,
    /// Keep only tailed lines containing this text
    pub search_text: Option<&'a str>,
}

/// Log browser over one base directory
pub struct LogView {
    guard: PathGuard,
    resolver: ProviderResolver,
    stylesheets: Vec<String>,
}

impl LogView {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_base(config.base_path()?, config.logview.stylesheets.clone())
    }

    pub fn with_base<P: AsRef<Path>>(base: P, stylesheets: Vec<String>) -> Result<Self> {
        let guard = PathGuard::new(base)?;
        tracing::info!(base = %guard.canonical_base().display(), "Log view ready");

        Ok(Self {
            guard,
            resolver: ProviderResolver::default(),
            stylesheets,
        })
    }

    pub fn base_path(&self) -> &Path {
        self.guard.base()
    }

    /// List the folder (or archive) `base`, relative to the base directory
    pub fn list(&self, base: Option<&str>, sort_by: Option<SortBy>, desc: bool) -> Result<Listing> {
        let folder = self.guard.folder(base);
        let canonical = self.guard.check(&folder, None)?;

        let provider = self.resolver.resolve(&folder)?;
        let mut files = provider.list_entries(&folder)?;
        sort_entries(&mut files, sort_by, desc);
        tracing::debug!(folder = %folder.display(), entries = files.len(), "Listed folder");

        Ok(Listing {
            files,
            sort_by,
            desc,
            current_folder: canonical.display().to_string(),
            base: base.map(encode_filename).unwrap_or_default(),
            parent: self.parent_of(&folder),
            stylesheets: self.stylesheets.clone(),
        })
    }

    fn parent_of(&self, folder: &Path) -> String {
        let base = self.guard.base();
        if folder == base {
            return String::new();
        }

        folder
            .parent()
            .and_then(|p| p.strip_prefix(base).ok())
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Write `filename` from the folder or archive `options.base` to `sink`,
    /// whole or tailed
    pub fn view(
        &self,
        filename: &str,
        options: &ViewOptions<'_>,
        sink: &mut dyn Write,
    ) -> Result<()> {
        let folder = self.guard.folder(options.base);
        self.guard.check(&folder, Some(filename))?;

        let provider = self.resolver.resolve(&folder)?;
        match options.tail_lines {
            Some(lines) => {
                let max_lines = usize::try_from(lines).unwrap_or(0);
                provider.tail_content(&folder, filename, sink, max_lines, options.search_text)?;
            }
            None => {
                let bytes = provider.stream_content(&folder, filename, sink)?;
                tracing::debug!(filename, bytes, "Streamed file");
            }
        }

        Ok(())
    }

    /// Scan every plain file of the base directory, oldest first, writing
    /// each line that contains `term` as `[filename] line`.
    ///
    /// Output already written stays written when a later file fails.
    pub fn search(&self, term: &str, sink: &mut dyn Write) -> Result<usize> {
        let folder = self.guard.base();
        let provider = self.resolver.resolve(folder)?;

        let mut files = provider.list_entries(folder)?;
        sort_entries(&mut files, Some(SortBy::Modified), false);

        let mut total = 0;
        for entry in files.iter().filter(|e| e.file_type() == FileType::File) {
            let name = entry.display_filename();
            let path = self.guard.check(folder, Some(name))?;

            let file = File::open(&path).map_err(FsError::io("open", &path))?;
            total += scan_lines(BufReader::new(file), term, name, sink)
                .map_err(FsError::io("search", &path))?;
        }

        tracing::debug!(term, matches = total, "Search finished");
        Ok(total)
    }
}
