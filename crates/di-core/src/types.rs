use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── SessionId ──

/// Opaque context-session identifier: 128 bits from the OS random source,
/// rendered as 32 lowercase hex characters. Never derived from content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accepts exactly 32 hex characters (either case). Anything else can
    /// never name a session, so callers treat `None` as "not found".
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() == 32 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(raw.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Files ──

/// One non-binary file of an uploaded codebase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub path: String,
    pub content: String,
}

impl ProjectFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// One record of a change set: either a per-file diff hunk or the full new
/// content of a changed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    pub path: String,
    pub content: String,
    pub is_diff: bool,
}

/// Ordered change records submitted for review. Only ever folded into a
/// review fingerprint, never stored on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    pub changes: Vec<ChangedFile>,
}

impl ChangeSet {
    /// Build from `(path, changeText)` pairs produced by a diff splitter.
    pub fn from_diff(records: Vec<(String, String)>) -> Self {
        Self {
            changes: records
                .into_iter()
                .map(|(path, content)| ChangedFile {
                    path,
                    content,
                    is_diff: true,
                })
                .collect(),
        }
    }

    /// Build from the files of a "changed files" archive.
    pub fn from_files(files: Vec<ProjectFile>) -> Self {
        Self {
            changes: files
                .into_iter()
                .map(|f| ChangedFile {
                    path: f.path,
                    content: f.content,
                    is_diff: false,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.changes.iter().map(|c| c.path.clone()).collect()
    }
}

// ── Context metadata ──

/// Sentinel histogram key for files without an extension.
pub const NO_EXTENSION: &str = "no-extension";

/// Aggregate statistics over a set of project files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextStats {
    pub total_files: usize,
    pub total_lines: usize,
    pub size_in_bytes: u64,
    pub files_by_extension: BTreeMap<String, usize>,
}

impl ContextStats {
    pub fn from_files(files: &[ProjectFile]) -> Self {
        let mut stats = Self {
            total_files: files.len(),
            ..Self::default()
        };
        for file in files {
            // Newline-delimited segments: "" and "a" both count as one line.
            stats.total_lines += file.content.split('\n').count();
            stats.size_in_bytes += file.content.len() as u64;
            *stats
                .files_by_extension
                .entry(extension_key(&file.path))
                .or_insert(0) += 1;
        }
        stats
    }
}

/// Lowercased extension with a leading dot, or [`NO_EXTENSION`].
pub fn extension_key(path: &str) -> String {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rfind('.') {
        // A leading dot alone (".gitignore") is a hidden file, not an extension.
        Some(idx) if idx > 0 && idx + 1 < name.len() => {
            format!(".{}", name[idx + 1..].to_ascii_lowercase())
        }
        _ => NO_EXTENSION.to_string(),
    }
}

/// Metadata persisted next to a context blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMetadata {
    #[serde(flatten)]
    pub stats: ContextStats,
    pub created_at: DateTime<Utc>,
}

/// Answer to "does this session still exist, and what's in it?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub context_id: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ContextStats>,
    /// Seconds until the session expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SessionInfo {
    pub fn missing(context_id: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
            exists: false,
            stats: None,
            expires_in: None,
            created_at: None,
        }
    }
}
