//! Directory browsing - the shared entry model and the live filesystem provider

use crate::tail::{tail_lines, write_lines, ReverseLineReader};
use crate::{FileProvider, FsError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Kind of a browsable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    File,
    Directory,
    Archive,
}

/// One browsable item of a directory or archive listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    filename: String,
    display_filename: String,
    modified: i64,
    size: u64,
    file_type: FileType,
}

impl FileEntry {
    /// Build an entry from its on-disk (or in-archive) name.
    ///
    /// The URL-safe `filename` is derived here so it always decodes back to
    /// `display_filename`.
    pub fn new(name: impl Into<String>, modified: i64, size: u64, file_type: FileType) -> Self {
        let display_filename = name.into();
        Self {
            filename: encode_filename(&display_filename),
            display_filename,
            modified,
            size,
            file_type,
        }
    }

    /// Percent-encoded name, safe to embed in a path or query string
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn display_filename(&self) -> &str {
        &self.display_filename
    }

    /// Last modification time in milliseconds since the Unix epoch
    pub fn modified(&self) -> i64 {
        self.modified
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }
}

/// Sort key for listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortBy {
    Size,
    Modified,
    #[default]
    Filename,
}

impl SortBy {
    fn compare(self, a: &FileEntry, b: &FileEntry) -> Ordering {
        match self {
            SortBy::Size => a.size.cmp(&b.size),
            SortBy::Modified => a.modified.cmp(&b.modified),
            SortBy::Filename => a.filename.cmp(&b.filename),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Size => "SIZE",
            SortBy::Modified => "MODIFIED",
            SortBy::Filename => "FILENAME",
        }
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "size" => Ok(SortBy::Size),
            "modified" => Ok(SortBy::Modified),
            "filename" | "name" => Ok(SortBy::Filename),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort entries ascending by `sort_by` (filename when absent), then reverse
/// the whole sequence when `desc` is set.
pub fn sort_entries(entries: &mut [FileEntry], sort_by: Option<SortBy>, desc: bool) {
    let sort_by = sort_by.unwrap_or_default();
    // sort_by is stable, so equal keys keep their input order
    entries.sort_by(|a, b| sort_by.compare(a, b));
    if desc {
        entries.reverse();
    }
}

/// Percent-encode a name for embedding in a URL
pub fn encode_filename(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

/// Decode a percent-encoded name, falling back to the input when it is not
/// valid UTF-8 after decoding
pub fn decode_filename(encoded: &str) -> Cow<'_, str> {
    urlencoding::decode(encoded).unwrap_or(Cow::Borrowed(encoded))
}

/// Archive detection is by extension only
pub fn is_archive_name(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.ends_with(".zip") || name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

/// Milliseconds since the Unix epoch, saturating at the `i64` range
pub(crate) fn system_time_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(e) => i64::try_from(e.duration().as_millis()).map_or(i64::MIN, |ms| -ms),
    }
}

/// Open a member for reading, mapping a missing file to `MemberNotFound`
fn open_member(folder: &Path, filename: &str) -> Result<File> {
    let path = folder.join(filename);
    File::open(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => FsError::MemberNotFound {
            container: folder.to_path_buf(),
            member: filename.to_string(),
        },
        _ => FsError::io("open", &path)(e),
    })
}

/// Provider for plain directories on the live filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemProvider;

impl FilesystemProvider {
    fn entry_for(path: &Path) -> Result<FileEntry> {
        let metadata = fs::metadata(path).map_err(FsError::io("stat", path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let modified = metadata
            .modified()
            .map(system_time_millis)
            .map_err(FsError::io("stat", path))?;

        let (file_type, size) = if metadata.is_dir() {
            (FileType::Directory, 0)
        } else if is_archive_name(&name) {
            (FileType::Archive, metadata.len())
        } else {
            (FileType::File, metadata.len())
        };

        Ok(FileEntry::new(name, modified, size, file_type))
    }
}

impl FileProvider for FilesystemProvider {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn can_handle(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(path).map_err(FsError::io("read directory", path))? {
            let entry = entry.map_err(FsError::io("read directory", path))?;
            entries.push(Self::entry_for(&entry.path())?);
        }

        Ok(entries)
    }

    fn stream_content(&self, path: &Path, filename: &str, sink: &mut dyn Write) -> Result<u64> {
        let mut file = open_member(path, filename)?;
        io::copy(&mut file, sink).map_err(FsError::io("stream", &path.join(filename)))
    }

    fn tail_content(
        &self,
        path: &Path,
        filename: &str,
        sink: &mut dyn Write,
        max_lines: usize,
        filter: Option<&str>,
    ) -> Result<()> {
        let file = open_member(path, filename)?;
        let target = path.join(filename);

        let reader = ReverseLineReader::new(file).map_err(FsError::io("tail", &target))?;
        let lines = tail_lines(reader, max_lines, filter).map_err(FsError::io("tail", &target))?;
        write_lines(sink, &lines).map_err(FsError::io("write", &target))
    }
}
