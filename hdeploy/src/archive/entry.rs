//! Archive entry descriptors.
//!
//! An [`ArchiveEntry`] describes one member of the archive without holding
//! its content in memory: file entries point at their source on disk and are
//! read only when the serializer copies them.

use super::error::AssemblyError;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::fmt;
use std::time::SystemTime;

/// A validated, forward-slash, relative archive path.
///
/// Directory paths always end in `/`; file paths never do. Paths never
/// contain backslashes, empty segments, `.` or `..`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryPath(String);

impl EntryPath {
    /// Build an entry path from a path relative to the staging root.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidEntryPath`] if `relative` is absolute,
    /// empty, or contains `.`/`..` components.
    pub fn from_relative(relative: &Utf8Path, is_directory: bool) -> Result<Self, AssemblyError> {
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Utf8Component::Normal(segment) => segments.push(segment),
                Utf8Component::RootDir | Utf8Component::Prefix(_) => {
                    return Err(invalid(relative.as_str(), "path is absolute"));
                }
                Utf8Component::CurDir | Utf8Component::ParentDir => {
                    return Err(invalid(relative.as_str(), "path is not normalized"));
                }
            }
        }
        Self::from_segments(relative.as_str(), &segments.join("/"), is_directory)
    }

    /// Parse a forward-slash path, as used for in-memory entries.
    ///
    /// Backslashes are treated as separators and a trailing `/` is accepted
    /// for directories.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidEntryPath`] if the path is absolute,
    /// empty, or contains empty, `.` or `..` segments.
    pub fn parse(raw: &str, is_directory: bool) -> Result<Self, AssemblyError> {
        if raw.starts_with('/') || raw.starts_with('\\') {
            return Err(invalid(raw, "path is absolute"));
        }
        let trimmed = if is_directory {
            raw.strip_suffix('/').unwrap_or(raw)
        } else {
            raw
        };
        Self::from_segments(raw, trimmed, is_directory)
    }

    fn from_segments(raw: &str, joined: &str, is_directory: bool) -> Result<Self, AssemblyError> {
        let normalized = joined.replace('\\', "/");
        if normalized.is_empty() {
            return Err(invalid(raw, "path is empty"));
        }
        for segment in normalized.split('/') {
            match segment {
                "" => return Err(invalid(raw, "path has an empty segment")),
                "." | ".." => return Err(invalid(raw, "path is not normalized")),
                _ => {}
            }
        }
        if is_directory {
            Ok(Self(format!("{normalized}/")))
        } else {
            Ok(Self(normalized))
        }
    }

    /// Return the path as stored in the archive.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for directory paths.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn invalid(path: &str, reason: &'static str) -> AssemblyError {
    AssemblyError::InvalidEntryPath {
        path: path.to_owned(),
        reason,
    }
}

/// Where the bytes of an entry come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryContent {
    /// A zero-length directory entry.
    Directory,
    /// A file on disk, read in chunks when the entry is written.
    File {
        /// Source file to copy.
        source: Utf8PathBuf,
        /// Size of the source when it was walked.
        size: u64,
    },
    /// Bytes held in memory.
    Inline(Vec<u8>),
}

/// One member of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    path: EntryPath,
    modified: SystemTime,
    content: EntryContent,
}

impl ArchiveEntry {
    /// Describe a directory entry.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidEntryPath`] if `path` is invalid.
    pub fn directory(path: &str, modified: SystemTime) -> Result<Self, AssemblyError> {
        Ok(Self {
            path: EntryPath::parse(path, true)?,
            modified,
            content: EntryContent::Directory,
        })
    }

    /// Describe a file entry whose content lives on disk.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidEntryPath`] if `path` is invalid.
    pub fn file(
        path: &str,
        source: Utf8PathBuf,
        size: u64,
        modified: SystemTime,
    ) -> Result<Self, AssemblyError> {
        Ok(Self {
            path: EntryPath::parse(path, false)?,
            modified,
            content: EntryContent::File { source, size },
        })
    }

    /// Describe a file entry whose content is held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidEntryPath`] if `path` is invalid.
    pub fn inline(
        path: &str,
        bytes: impl Into<Vec<u8>>,
        modified: SystemTime,
    ) -> Result<Self, AssemblyError> {
        Ok(Self {
            path: EntryPath::parse(path, false)?,
            modified,
            content: EntryContent::Inline(bytes.into()),
        })
    }

    pub(crate) const fn from_parts(
        path: EntryPath,
        modified: SystemTime,
        content: EntryContent,
    ) -> Self {
        Self {
            path,
            modified,
            content,
        }
    }

    /// Return the archive path.
    #[must_use]
    pub const fn path(&self) -> &EntryPath {
        &self.path
    }

    /// Return the modification time recorded for the entry.
    #[must_use]
    pub const fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Return the entry content.
    #[must_use]
    pub const fn content(&self) -> &EntryContent {
        &self.content
    }

    /// Returns true for directory entries.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self.content, EntryContent::Directory)
    }
}
