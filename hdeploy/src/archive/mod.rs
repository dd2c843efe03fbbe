//! Job jar assembly.
//!
//! A staged directory tree is walked lazily ([`StagedTree`]) and serialized
//! into a ZIP container whose first entry is the manifest
//! ([`ArchiveManifest`]). Entry paths are relative to the staging root and
//! always use forward slashes.

mod entry;
mod error;
mod manifest;
mod timestamp;
mod walk;
mod writer;

pub use entry::{ArchiveEntry, EntryContent, EntryPath};
pub use error::AssemblyError;
pub use manifest::{ArchiveManifest, MANIFEST_PATH, MANIFEST_VERSION};
pub use timestamp::zip_timestamp;
pub use walk::{Entries, StagedTree};
pub use writer::{ArchiveSummary, write_archive};

use camino::Utf8Path;
use std::io::{Seek, Write};

/// Archive every file and directory below `root` into `sink`.
///
/// # Errors
///
/// Propagates any [`AssemblyError`] from walking the tree or writing the
/// archive.
pub fn assemble<W: Write + Seek>(
    root: &Utf8Path,
    manifest: &ArchiveManifest,
    sink: &mut W,
) -> Result<ArchiveSummary, AssemblyError> {
    write_archive(sink, manifest, StagedTree::new(root).entries())
}
