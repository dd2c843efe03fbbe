//! Library inventory of the target runtime.
//!
//! The runtime ships its own jars in `<hadoop home>/lib`. This module lists
//! that directory and derives the identifier of every jar from its filename
//! alone, producing the set of dependencies the runtime already provides.

use std::collections::BTreeSet;
use std::io;

use camino::Utf8Path;
use log::{debug, trace, warn};

use crate::artifact_id::ArtifactId;
use crate::error::{DeployError, Result};

/// File extension of archives that count towards the inventory.
pub const ARCHIVE_EXTENSION: &str = "jar";

/// A library filename split into its grammar components.
///
/// The grammar is `name [ "-" version ] "." extension`, where the version is
/// everything after the last hyphen of the stem. The split is purely lexical,
/// so `commons-io.jar` parses as name `commons` and version `io`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryFileName<'a> {
    name: &'a str,
    version: Option<&'a str>,
    extension: &'a str,
}

impl<'a> LibraryFileName<'a> {
    /// Return the name component (the stem when there is no version).
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }

    /// Return the version component, if the stem contains a hyphen.
    #[must_use]
    pub const fn version(&self) -> Option<&'a str> {
        self.version
    }

    /// Return the extension without the leading dot.
    #[must_use]
    pub const fn extension(&self) -> &'a str {
        self.extension
    }

    /// Returns true when the file is a Java archive.
    #[must_use]
    pub fn is_archive(&self) -> bool {
        self.extension == ARCHIVE_EXTENSION
    }

    /// The inventory identifier this file contributes.
    ///
    /// Only versioned filenames with a non-empty name contribute. A jar such
    /// as `tools.jar` has no hyphen and therefore no identifier; runtime
    /// jars of that shape are only excluded through the reserved prefixes.
    #[must_use]
    pub fn identifier(&self) -> Option<ArtifactId> {
        match self.version {
            Some(_) if !self.name.is_empty() => Some(ArtifactId::from(self.name)),
            _ => None,
        }
    }
}

/// Parse a library filename.
///
/// Returns `None` when the filename has no extension or an empty stem.
///
/// # Examples
///
/// ```
/// use hdeploy::inventory::parse_library_file_name;
///
/// let parsed = parse_library_file_name("hadoop-core-1.0.0.jar").expect("valid name");
/// assert_eq!(parsed.name(), "hadoop-core");
/// assert_eq!(parsed.version(), Some("1.0.0"));
/// assert_eq!(parsed.extension(), "jar");
/// ```
#[must_use]
pub fn parse_library_file_name(file_name: &str) -> Option<LibraryFileName<'_>> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }

    let (name, version) = match stem.rsplit_once('-') {
        Some((name, version)) => (name, Some(version)),
        None => (stem, None),
    };

    Some(LibraryFileName {
        name,
        version,
        extension,
    })
}

/// Identifiers of the dependencies the target runtime already provides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryInventory(BTreeSet<ArtifactId>);

impl LibraryInventory {
    /// Returns true if `id` appears verbatim in the inventory.
    #[must_use]
    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.0.contains(id)
    }

    /// Number of distinct identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the runtime provides nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the identifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactId> {
        self.0.iter()
    }
}

impl FromIterator<ArtifactId> for LibraryInventory {
    fn from_iter<I: IntoIterator<Item = ArtifactId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Scan `library_dir` recursively and collect the identifiers of its jars.
///
/// # Errors
///
/// Returns [`DeployError::LibraryDirectory`] if the directory does not
/// exist, is not a directory, or cannot be read.
pub fn compute_library_inventory(library_dir: &Utf8Path) -> Result<LibraryInventory> {
    if !library_dir.exists() {
        return Err(library_error(library_dir, "directory does not exist"));
    }
    if !library_dir.is_dir() {
        return Err(library_error(library_dir, "not a directory"));
    }

    let mut identifiers = BTreeSet::new();
    collect_identifiers(library_dir, &mut identifiers)
        .map_err(|e| library_error(library_dir, &e.to_string()))?;

    debug!(
        "found {} runtime-provided identifiers in {library_dir}",
        identifiers.len()
    );
    Ok(LibraryInventory(identifiers))
}

fn collect_identifiers(dir: &Utf8Path, identifiers: &mut BTreeSet<ArtifactId>) -> io::Result<()> {
    for entry in dir.read_dir_utf8()? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                trace!("skipping non UTF-8 entry in {dir}: {e}");
                continue;
            }
            Err(e) => return Err(e),
        };

        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_symlink() && path.is_dir() {
            warn!("not following symlinked directory {path}");
            continue;
        }
        if file_type.is_dir() {
            collect_identifiers(path, identifiers)?;
            continue;
        }

        let Some(parsed) = parse_library_file_name(entry.file_name()) else {
            continue;
        };
        if !parsed.is_archive() {
            continue;
        }
        match parsed.identifier() {
            Some(id) => {
                identifiers.insert(id);
            }
            None => trace!("{path} has no version suffix; not added to inventory"),
        }
    }
    Ok(())
}

fn library_error(path: &Utf8Path, reason: &str) -> DeployError {
    DeployError::LibraryDirectory {
        path: path.to_owned(),
        reason: reason.to_owned(),
    }
}
