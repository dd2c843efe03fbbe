//! Lazy traversal of a staged directory tree.
//!
//! [`StagedTree::entries`] yields one [`ArchiveEntry`] per directory and file
//! below the root, depth first, parents before their children. Siblings are
//! visited in byte order of their names so the same tree always produces
//! the same sequence. Only one directory listing per level of depth is held
//! in memory at a time. Symlinked files are read through the link, while
//! symlinked directories are skipped.

use super::entry::{ArchiveEntry, EntryContent, EntryPath};
use super::error::AssemblyError;
use camino::{Utf8Path, Utf8PathBuf};
use log::{trace, warn};
use std::io;
use std::time::SystemTime;

/// A directory whose contents become archive entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedTree {
    root: Utf8PathBuf,
}

impl StagedTree {
    /// Describe the tree rooted at `root`. Nothing is read until iteration.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Return the root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Iterate over the entries below the root. The root itself is not an
    /// entry.
    #[must_use]
    pub fn entries(&self) -> Entries {
        Entries {
            root: self.root.clone(),
            stack: Vec::new(),
            state: WalkState::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    Pending,
    Walking,
    Done,
}

/// Iterator returned by [`StagedTree::entries`].
///
/// The first error ends the iteration.
#[derive(Debug)]
pub struct Entries {
    root: Utf8PathBuf,
    stack: Vec<std::vec::IntoIter<Utf8PathBuf>>,
    state: WalkState,
}

impl Entries {
    fn descend(&mut self, dir: &Utf8Path) -> Result<(), AssemblyError> {
        let children = sorted_children(dir).map_err(|source| AssemblyError::Read {
            path: dir.to_owned(),
            source,
        })?;
        self.stack.push(children.into_iter());
        Ok(())
    }

    fn visit(&mut self, path: &Utf8Path) -> Result<Option<ArchiveEntry>, AssemblyError> {
        let read_error = |source| AssemblyError::Read {
            path: path.to_owned(),
            source,
        };
        let link = path.symlink_metadata().map_err(read_error)?;
        let metadata = if link.is_symlink() {
            let target = path.metadata().map_err(read_error)?;
            if target.is_dir() {
                warn!("not following symlinked directory {path}");
                return Ok(None);
            }
            target
        } else {
            link
        };
        let relative = path.strip_prefix(&self.root).map_err(|_| {
            AssemblyError::InvalidEntryPath {
                path: path.to_string(),
                reason: "path is outside the staged tree",
            }
        })?;
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        if metadata.is_dir() {
            let entry_path = EntryPath::from_relative(relative, true)?;
            self.descend(path)?;
            trace!("walk: directory {entry_path}");
            return Ok(Some(ArchiveEntry::from_parts(
                entry_path,
                modified,
                EntryContent::Directory,
            )));
        }

        let entry_path = EntryPath::from_relative(relative, false)?;
        trace!("walk: file {entry_path} ({} bytes)", metadata.len());
        Ok(Some(ArchiveEntry::from_parts(
            entry_path,
            modified,
            EntryContent::File {
                source: path.to_owned(),
                size: metadata.len(),
            },
        )))
    }
}

impl Iterator for Entries {
    type Item = Result<ArchiveEntry, AssemblyError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            WalkState::Done => return None,
            WalkState::Pending => {
                self.state = WalkState::Walking;
                let root = self.root.clone();
                if let Err(err) = self.descend(&root) {
                    self.state = WalkState::Done;
                    return Some(Err(err));
                }
            }
            WalkState::Walking => {}
        }

        loop {
            let Some(level) = self.stack.last_mut() else {
                self.state = WalkState::Done;
                return None;
            };
            let Some(path) = level.next() else {
                self.stack.pop();
                continue;
            };
            match self.visit(&path) {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => {}
                Err(err) => {
                    self.state = WalkState::Done;
                    self.stack.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}

fn sorted_children(dir: &Utf8Path) -> io::Result<Vec<Utf8PathBuf>> {
    let mut children = dir
        .read_dir_utf8()?
        .map(|entry| entry.map(|e| e.into_path()))
        .collect::<io::Result<Vec<_>>>()?;
    children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(children)
}
