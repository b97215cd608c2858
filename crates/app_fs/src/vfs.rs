//! Archive providers - zip and tar.gz files browsed as virtual directories
//!
//! Archive members are listed flat under their stored names and are always
//! plain files, even when a member name looks like another archive.

use crate::encoding::{self, EncodingHint};
use crate::tail::{tail_lines, write_lines, ReverseLineReader};
use crate::{FileEntry, FileProvider, FileType, FsError, Result};
use chrono::NaiveDate;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::SpooledTempFile;

/// Decompressed members up to this size are tailed from memory, larger ones
/// spill to a temporary file
const SPOOL_THRESHOLD: usize = 16 * 1024 * 1024;

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    path.is_file() && extensions.iter().any(|ext| name.ends_with(ext))
}

fn member_not_found(archive: &Path, member: &str) -> FsError {
    FsError::MemberNotFound {
        container: archive.to_path_buf(),
        member: member.to_string(),
    }
}

/// Decompress a member into a seekable spool and tail it
fn tail_member(
    member: &mut dyn Read,
    target: &Path,
    sink: &mut dyn Write,
    max_lines: usize,
    filter: Option<&str>,
) -> Result<()> {
    let mut spool = SpooledTempFile::new(SPOOL_THRESHOLD);
    let size = io::copy(member, &mut spool).map_err(FsError::io("decompress", target))?;
    tracing::debug!(
        path = %target.display(),
        size,
        spilled = spool.is_rolled(),
        "Member decompressed for tail"
    );

    let reader = ReverseLineReader::new(spool).map_err(FsError::io("tail", target))?;
    let lines = tail_lines(reader, max_lines, filter).map_err(FsError::io("tail", target))?;
    write_lines(sink, &lines).map_err(FsError::io("write", target))
}

// ZIP implementation

/// Provider for `.zip` archives
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiveProvider;

impl ZipArchiveProvider {
    fn open(path: &Path) -> Result<zip::ZipArchive<File>> {
        let file = File::open(path).map_err(FsError::io("open", path))?;
        zip::ZipArchive::new(file).map_err(|e| FsError::archive(path, e))
    }

    /// Member names are UTF-8 in modern archives; older tools wrote them in
    /// the system code page
    fn member_name(raw_name: &[u8], hint: EncodingHint) -> String {
        match std::str::from_utf8(raw_name) {
            Ok(s) => s.to_string(),
            Err(_) => encoding::decode_bytes(raw_name, hint).0,
        }
    }

    /// Index of the file member whose decoded name is exactly `member`
    fn find(archive: &mut zip::ZipArchive<File>, path: &Path, member: &str) -> Result<usize> {
        let hint = encoding::system_encoding_hint();

        for i in 0..archive.len() {
            let file = archive.by_index_raw(i).map_err(|e| FsError::archive(path, e))?;
            if !file.is_dir() && Self::member_name(file.name_raw(), hint) == member {
                return Ok(i);
            }
        }

        Err(member_not_found(path, member))
    }

    fn modified_millis(dt: zip::DateTime) -> Option<i64> {
        NaiveDate::from_ymd_opt(dt.year().into(), dt.month().into(), dt.day().into())?
            .and_hms_opt(dt.hour().into(), dt.minute().into(), dt.second().into())
            .map(|t| t.and_utc().timestamp_millis())
    }
}

impl FileProvider for ZipArchiveProvider {
    fn name(&self) -> &'static str {
        "zip"
    }

    fn can_handle(&self, path: &Path) -> bool {
        has_extension(path, &[".zip"])
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<FileEntry>> {
        let mut archive = Self::open(path)?;
        let hint = encoding::system_encoding_hint();
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let file = archive.by_index_raw(i).map_err(|e| FsError::archive(path, e))?;
            if file.is_dir() {
                continue;
            }

            let modified = file
                .last_modified()
                .and_then(Self::modified_millis)
                .unwrap_or_default();

            entries.push(FileEntry::new(
                Self::member_name(file.name_raw(), hint),
                modified,
                file.size(),
                FileType::File,
            ));
        }

        Ok(entries)
    }

    fn stream_content(&self, path: &Path, filename: &str, sink: &mut dyn Write) -> Result<u64> {
        let mut archive = Self::open(path)?;
        let index = Self::find(&mut archive, path, filename)?;
        let mut member = archive.by_index(index).map_err(|e| FsError::archive(path, e))?;

        io::copy(&mut member, sink).map_err(FsError::io("stream", &path.join(filename)))
    }

    fn tail_content(
        &self,
        path: &Path,
        filename: &str,
        sink: &mut dyn Write,
        max_lines: usize,
        filter: Option<&str>,
    ) -> Result<()> {
        let mut archive = Self::open(path)?;
        let index = Self::find(&mut archive, path, filename)?;
        let mut member = archive.by_index(index).map_err(|e| FsError::archive(path, e))?;

        tail_member(&mut member, &path.join(filename), sink, max_lines, filter)
    }
}

// TAR.GZ implementation

/// Provider for `.tar.gz` / `.tgz` archives
#[derive(Debug, Default, Clone, Copy)]
pub struct TarGzArchiveProvider;

impl TarGzArchiveProvider {
    fn open(path: &Path) -> Result<tar::Archive<GzDecoder<File>>> {
        let file = File::open(path).map_err(FsError::io("open", path))?;
        Ok(tar::Archive::new(GzDecoder::new(file)))
    }

    /// Run `f` on the file member stored as `member`
    fn with_member<T>(
        path: &Path,
        member: &str,
        f: impl FnOnce(&mut dyn Read) -> Result<T>,
    ) -> Result<T> {
        let mut archive = Self::open(path)?;

        for entry in archive.entries().map_err(FsError::io("read archive", path))? {
            let mut entry = entry.map_err(FsError::io("read archive", path))?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let matches = entry
                .path()
                .map_err(FsError::io("read archive", path))?
                .to_string_lossy()
                == member;
            if matches {
                return f(&mut entry);
            }
        }

        Err(member_not_found(path, member))
    }
}

impl FileProvider for TarGzArchiveProvider {
    fn name(&self) -> &'static str {
        "tar.gz"
    }

    fn can_handle(&self, path: &Path) -> bool {
        has_extension(path, &[".tar.gz", ".tgz"])
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<FileEntry>> {
        let mut archive = Self::open(path)?;
        let mut entries = Vec::new();

        for entry in archive.entries().map_err(FsError::io("read archive", path))? {
            let entry = entry.map_err(FsError::io("read archive", path))?;
            let header = entry.header();
            if !header.entry_type().is_file() {
                continue;
            }

            let name = entry
                .path()
                .map_err(FsError::io("read archive", path))?
                .to_string_lossy()
                .into_owned();
            let modified = header
                .mtime()
                .ok()
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(|secs| secs.checked_mul(1000))
                .unwrap_or_default();

            entries.push(FileEntry::new(name, modified, entry.size(), FileType::File));
        }

        Ok(entries)
    }

    fn stream_content(&self, path: &Path, filename: &str, sink: &mut dyn Write) -> Result<u64> {
        let target = path.join(filename);
        Self::with_member(path, filename, |member| {
            io::copy(member, sink).map_err(FsError::io("stream", &target))
        })
    }

    fn tail_content(
        &self,
        path: &Path,
        filename: &str,
        sink: &mut dyn Write,
        max_lines: usize,
        filter: Option<&str>,
    ) -> Result<()> {
        let target = path.join(filename);
        Self::with_member(path, filename, |member| {
            tail_member(member, &target, sink, max_lines, filter)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs;
    use tempfile::TempDir;

    fn write_zip(path: &Path, members: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, data) in members {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    fn write_tar_gz(path: &Path, members: &[(&str, &[u8])]) {
        write_tar_gz_at(path, members, 1_700_000_000);
    }

    fn write_tar_gz_at(path: &Path, members: &[(&str, &[u8])], mtime: u64) {
        let file = fs::File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, data) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_mtime(mtime);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_zip_listing_and_stream() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("app.zip");
        write_zip(&archive, &[("out.log", b"a\nb\nc\n")]);

        let provider = ZipArchiveProvider;
        assert!(provider.can_handle(&archive));

        let entries = provider.list_entries(&archive).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_filename(), "out.log");
        assert_eq!(entries[0].file_type(), FileType::File);
        assert_eq!(entries[0].size(), 6);

        let mut out = Vec::new();
        provider.stream_content(&archive, "out.log", &mut out).unwrap();
        assert_eq!(out, b"a\nb\nc\n");
    }

    #[test]
    fn test_zip_nested_archive_is_a_file() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("app.zip");
        write_zip(&archive, &[("inner.zip", b"PK"), ("logs/today.log", b"x\n")]);

        let entries = ZipArchiveProvider.list_entries(&archive).unwrap();
        assert!(entries.iter().all(|e| e.file_type() == FileType::File));
        assert!(crate::is_archive_name(entries[0].display_filename()));
        assert_eq!(entries[1].display_filename(), "logs/today.log");
        assert_eq!(entries[1].filename(), "logs%2Ftoday.log");
    }

    #[test]
    fn test_zip_tail_and_missing_member() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("app.zip");
        write_zip(&archive, &[("out.log", b"INFO 1\nWARN 2\nINFO 3\nWARN 4\n")]);

        let mut out = Vec::new();
        ZipArchiveProvider
            .tail_content(&archive, "out.log", &mut out, 5, Some("WARN"))
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "WARN 2\nWARN 4\n");

        let err = ZipArchiveProvider
            .stream_content(&archive, "other.log", &mut Vec::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MemberNotFound);
    }

    #[test]
    fn test_corrupt_zip_is_io_failure() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();

        let err = ZipArchiveProvider.list_entries(&archive).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn test_tar_gz_listing_stream_and_tail() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("app.tar.gz");
        write_tar_gz(&archive, &[("out.log", b"a\nb\nc\n"), ("err.log", b"boom\n")]);

        let provider = TarGzArchiveProvider;
        assert!(provider.can_handle(&archive));
        assert!(!ZipArchiveProvider.can_handle(&archive));

        let entries = provider.list_entries(&archive).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].display_filename(), "out.log");
        assert_eq!(entries[0].modified(), 1_700_000_000_000);
        assert_eq!(entries[1].size(), 5);

        let mut out = Vec::new();
        assert_eq!(provider.stream_content(&archive, "out.log", &mut out).unwrap(), 6);
        assert_eq!(out, b"a\nb\nc\n");

        let mut out = Vec::new();
        provider
            .tail_content(&archive, "out.log", &mut out, 2, None)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "b\nc\n");

        let err = provider
            .tail_content(&archive, "missing.log", &mut Vec::new(), 2, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MemberNotFound);
    }

    #[test]
    fn test_tar_gz_out_of_range_mtime() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("future.tar.gz");
        write_tar_gz_at(&archive, &[("out.log", b"a\n")], u64::MAX / 2);

        let entries = TarGzArchiveProvider.list_entries(&archive).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].modified(), 0);
    }
}
