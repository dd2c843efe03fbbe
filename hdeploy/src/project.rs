//! Project model and the dependency-resolution contract.
//!
//! Packing consumes an already-resolved, flat dependency list. Resolution
//! itself belongs to the build tool; this module only defines the shape of
//! its output and the [`DependencyResolver`] seam through which it arrives.

use crate::artifact_id::ArtifactId;
use crate::error::Result;
use crate::naming::ArchiveName;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// The artifact type that denotes a Java archive.
pub const ARCHIVE_KIND: &str = "jar";

/// A single resolved dependency and the file that backs it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Artifact {
    /// Version-less logical name of the dependency.
    pub identifier: ArtifactId,
    /// Location of the resolved file on disk.
    pub file: Utf8PathBuf,
    /// Artifact type as reported by the resolver (`jar` for archives).
    pub kind: String,
}

impl Artifact {
    /// Create an archive artifact.
    #[must_use]
    pub fn archive(identifier: impl Into<ArtifactId>, file: impl Into<Utf8PathBuf>) -> Self {
        Self {
            identifier: identifier.into(),
            file: file.into(),
            kind: ARCHIVE_KIND.to_owned(),
        }
    }

    /// Returns true when the artifact is a Java archive.
    #[must_use]
    pub fn is_archive(&self) -> bool {
        self.kind == ARCHIVE_KIND
    }

    /// Return the backing file's name, if the path has one.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file.file_name()
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.identifier, self.kind, self.file)
    }
}

/// An unordered collection of resolved artifacts.
///
/// Backed by an ordered set so iteration is deterministic no matter what
/// order the resolver produced. Duplicate artifacts collapse into one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependencySet(BTreeSet<Artifact>);

impl DependencySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact, returning false if it was already present.
    pub fn insert(&mut self, artifact: Artifact) -> bool {
        self.0.insert(artifact)
    }

    /// Returns true if the set contains `artifact`.
    #[must_use]
    pub fn contains(&self, artifact: &Artifact) -> bool {
        self.0.contains(artifact)
    }

    /// Iterate over the artifacts in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.0.iter()
    }

    /// Number of artifacts in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set holds no artifacts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comma-separated identifiers, for log lines.
    #[must_use]
    pub fn identifiers(&self) -> String {
        self.0
            .iter()
            .map(|a| a.identifier.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<Artifact> for DependencySet {
    fn from_iter<I: IntoIterator<Item = Artifact>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for DependencySet {
    type Item = Artifact;
    type IntoIter = std::collections::btree_set::IntoIter<Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a Artifact;
    type IntoIter = std::collections::btree_set::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Produces the resolved dependency list of a project.
#[cfg_attr(test, mockall::automock)]
pub trait DependencyResolver {
    /// Resolve the project's dependencies into a flat set.
    ///
    /// # Errors
    ///
    /// Returns an error if the dependency source cannot be read.
    fn resolve(&self) -> Result<DependencySet>;
}

/// Everything the packer needs to know about the project being shipped.
#[derive(Debug, Clone)]
pub struct Project {
    /// The project's own artifact identifier.
    pub artifact_id: ArtifactId,
    /// The project version, when it has one.
    pub version: Option<String>,
    /// Directory holding the compiled classes and resources.
    pub classes_directory: Utf8PathBuf,
    /// Directory that receives the staging tree and the archive.
    pub output_directory: Utf8PathBuf,
    /// Resolved dependencies, before runtime exclusions are applied.
    pub dependencies: DependencySet,
}

impl Project {
    /// Build a project description by asking `resolver` for dependencies.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by the resolver.
    pub fn resolve_with(
        artifact_id: ArtifactId,
        version: Option<String>,
        layout: ProjectLayout,
        resolver: &dyn DependencyResolver,
    ) -> Result<Self> {
        let dependencies = resolver.resolve()?;
        Ok(Self {
            artifact_id,
            version,
            classes_directory: layout.classes_directory,
            output_directory: layout.output_directory,
            dependencies,
        })
    }

    /// Return the name of this project's job jar.
    #[must_use]
    pub fn archive_name(&self) -> ArchiveName {
        ArchiveName::new(self.artifact_id.clone(), self.version.as_deref())
    }

    /// Return where the job jar is written.
    #[must_use]
    pub fn archive_path(&self) -> Utf8PathBuf {
        self.output_directory.join(self.archive_name().filename())
    }

    /// Return the staging root inside the output directory.
    #[must_use]
    pub fn staging_root(&self) -> Utf8PathBuf {
        self.output_directory.join("root")
    }
}

/// Build directories of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Directory holding compiled output.
    pub classes_directory: Utf8PathBuf,
    /// Directory that receives packaging output.
    pub output_directory: Utf8PathBuf,
}

impl ProjectLayout {
    /// Conventional layout below a build directory.
    ///
    /// Classes live in `<build>/classes` and output goes to
    /// `<build>/hadoop-deploy`.
    #[must_use]
    pub fn conventional(build_directory: &Utf8Path) -> Self {
        Self {
            classes_directory: build_directory.join("classes"),
            output_directory: build_directory.join("hadoop-deploy"),
        }
    }
}
