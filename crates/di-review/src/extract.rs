//! Turning an uploaded codebase into project files.
//!
//! Byte-level archive formats are decoded elsewhere and handed in through
//! [`ArchiveSource`]; this module owns the filtering rules (binary assets,
//! vendored and generated directories, non-UTF-8 payloads) and the size
//! limit. Filtering is per entry, so one corrupt or binary entry never
//! fails the whole archive.

use std::path::{Path, PathBuf};

use di_core::{ExtractError, ProjectFile};
use tracing::debug;
use walkdir::WalkDir;

/// Default raw-size limit (50 MiB), overridable with `MAX_ZIP_SIZE`.
pub const DEFAULT_MAX_ARCHIVE_BYTES: u64 = 50 * 1024 * 1024;

const SKIP_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "svg", "ico", "pdf", "doc", "docx", "xls", "xlsx", "zip",
    "tar", "gz", "rar", "exe", "dll", "so", "dylib", "mp3", "mp4", "avi", "mov", "ttf", "woff",
    "woff2", "eot",
];

const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "coverage",
    ".next",
    ".nuxt",
    "vendor",
    "__pycache__",
];

/// One raw entry of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub data: Vec<u8>,
    pub is_dir: bool,
}

impl ArchiveEntry {
    pub fn file(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data: Vec::new(),
            is_dir: true,
        }
    }
}

/// Anything that can list raw archive entries, in a stable order.
pub trait ArchiveSource {
    fn entries(&self) -> Result<Vec<ArchiveEntry>, ExtractError>;
}

impl ArchiveSource for Vec<ArchiveEntry> {
    fn entries(&self) -> Result<Vec<ArchiveEntry>, ExtractError> {
        Ok(self.clone())
    }
}

/// An unpacked codebase on disk.
///
/// Entries come back sorted by path so the same tree always flattens to the
/// same context blob. Skipped directories are not descended into.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArchiveSource for DirectorySource {
    fn entries(&self) -> Result<Vec<ArchiveEntry>, ExtractError> {
        if !self.root.is_dir() {
            return Err(ExtractError::Malformed(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                !(e.file_type().is_dir()
                    && e.file_name().to_str().is_some_and(|n| SKIP_DIRS.contains(&n)))
            });

        let mut entries = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| ExtractError::Io(e.into()))?;
            let Some(path) = relative_path(&self.root, entry.path()) else {
                continue;
            };
            if entry.file_type().is_dir() {
                entries.push(ArchiveEntry::dir(path));
            } else if entry.file_type().is_file() {
                entries.push(ArchiveEntry::file(path, std::fs::read(entry.path())?));
            }
        }
        Ok(entries)
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

/// Applies the codebase filtering rules to an [`ArchiveSource`].
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    max_bytes: u64,
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_ARCHIVE_BYTES,
        }
    }
}

impl ArchiveExtractor {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Keep the readable code files of `source`, in source order.
    pub fn extract(&self, source: &dyn ArchiveSource) -> Result<Vec<ProjectFile>, ExtractError> {
        let entries = source.entries()?;

        let size: u64 = entries.iter().map(|e| e.data.len() as u64).sum();
        if size > self.max_bytes {
            return Err(ExtractError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        let mut files = Vec::new();
        for entry in entries {
            if entry.is_dir {
                continue;
            }
            let path = normalize_path(&entry.path);
            if path.is_empty() || should_skip(&path) {
                continue;
            }
            match decode_text(entry.data) {
                Some(content) => files.push(ProjectFile { path, content }),
                None => debug!(path = %path, "skipping binary entry"),
            }
        }

        if files.is_empty() {
            return Err(ExtractError::NoReadableFiles);
        }
        Ok(files)
    }
}

fn normalize_path(raw: &str) -> String {
    let path = raw.replace('\\', "/");
    path.trim_start_matches("./").trim_start_matches('/').to_string()
}

/// Whether a file is excluded by extension or by living under a vendored
/// or generated directory.
pub fn should_skip(path: &str) -> bool {
    let mut components: Vec<&str> = path.split('/').collect();
    let Some(name) = components.pop() else {
        return true;
    };
    if components.iter().any(|dir| SKIP_DIRS.contains(dir)) {
        return true;
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            SKIP_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        _ => false,
    }
}

/// UTF-8 text without NUL bytes, or `None` for binary payloads.
fn decode_text(data: Vec<u8>) -> Option<String> {
    if data.contains(&0) {
        return None;
    }
    String::from_utf8(data).ok()
}
