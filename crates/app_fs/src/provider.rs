//! Backing-store abstraction and provider resolution

use crate::{
    FileEntry, FilesystemProvider, FsError, Result, TarGzArchiveProvider, ZipArchiveProvider,
};
use std::io::Write;
use std::path::Path;

/// A kind of backing store that can be browsed like a directory
///
/// Implementations hold no per-request state and are shared read-only
/// between concurrent requests.
pub trait FileProvider: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Whether this provider can browse `path`
    fn can_handle(&self, path: &Path) -> bool;

    /// List the entries of `path`, in no particular order
    fn list_entries(&self, path: &Path) -> Result<Vec<FileEntry>>;

    /// Copy the full content of `filename` inside `path` to `sink`,
    /// returning the number of bytes written
    fn stream_content(&self, path: &Path, filename: &str, sink: &mut dyn Write) -> Result<u64>;

    /// Write the last `max_lines` lines of `filename` inside `path` to
    /// `sink`, optionally keeping only lines that contain `filter`
    fn tail_content(
        &self,
        path: &Path,
        filename: &str,
        sink: &mut dyn Write,
        max_lines: usize,
        filter: Option<&str>,
    ) -> Result<()>;
}

/// Ordered list of providers, tried first to last
pub struct ProviderResolver {
    providers: Vec<Box<dyn FileProvider>>,
}

impl ProviderResolver {
    pub fn new(providers: Vec<Box<dyn FileProvider>>) -> Self {
        Self { providers }
    }

    /// Return the first provider that can handle `path`
    pub fn resolve(&self, path: &Path) -> Result<&dyn FileProvider> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.can_handle(path))
            .map(|p| &**p)
            .ok_or_else(|| FsError::NoProviderFound(path.to_path_buf()))?;

        tracing::debug!(
            provider = provider.name(),
            path = %path.display(),
            "Resolved file provider"
        );
        Ok(provider)
    }
}

impl Default for ProviderResolver {
    /// Filesystem, then zip, then tar.gz
    fn default() -> Self {
        Self::new(vec![
            Box::new(FilesystemProvider),
            Box::new(ZipArchiveProvider),
            Box::new(TarGzArchiveProvider),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn write_zip(path: &Path) {
        let file = fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("out.log", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"a\n").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_resolution_order() {
        let dir = TempDir::new().unwrap();
        let resolver = ProviderResolver::default();

        assert_eq!(resolver.resolve(dir.path()).unwrap().name(), "filesystem");

        let zip_path = dir.path().join("app.zip");
        write_zip(&zip_path);
        assert_eq!(resolver.resolve(&zip_path).unwrap().name(), "zip");

        let tgz_path = dir.path().join("app.tgz");
        fs::write(&tgz_path, b"").unwrap();
        assert_eq!(resolver.resolve(&tgz_path).unwrap().name(), "tar.gz");
    }

    #[test]
    fn test_directory_named_like_archive_is_a_directory() {
        let dir = TempDir::new().unwrap();
        let odd = dir.path().join("odd.zip");
        fs::create_dir(&odd).unwrap();
        let resolver = ProviderResolver::default();
        assert_eq!(resolver.resolve(&odd).unwrap().name(), "filesystem");
    }

    #[test]
    fn test_plain_file_has_no_provider() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("app.log");
        fs::write(&plain, "x\n").unwrap();

        let resolver = ProviderResolver::default();
        let err = resolver.resolve(&plain).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NoProviderFound);

        let missing = dir.path().join("missing.zip");
        let err = resolver.resolve(&missing).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NoProviderFound);
    }
}
