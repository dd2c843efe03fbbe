//! Job jar naming policy.
//!
//! Archives are named `<artifact id>-hdeploy.jar`, or
//! `<artifact id>-<version>-hdeploy.jar` when the project has a version.

use crate::artifact_id::ArtifactId;
use std::fmt;

/// The fixed suffix marking archives produced by this tool.
const ARCHIVE_SUFFIX: &str = "hdeploy";

/// The fixed file extension for job jars.
const ARCHIVE_EXTENSION: &str = ".jar";

/// The filename of a packed job jar.
///
/// # Examples
///
/// ```
/// use hdeploy::artifact_id::ArtifactId;
/// use hdeploy::naming::ArchiveName;
///
/// let name = ArchiveName::new(ArtifactId::from("wordcount"), Some("1.0"));
/// assert_eq!(name.to_string(), "wordcount-1.0-hdeploy.jar");
///
/// let unversioned = ArchiveName::new(ArtifactId::from("wordcount"), None);
/// assert_eq!(unversioned.filename(), "wordcount-hdeploy.jar");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    artifact_id: ArtifactId,
    version: Option<String>,
}

impl ArchiveName {
    /// Create an archive name. A blank version is treated as absent.
    #[must_use]
    pub fn new(artifact_id: ArtifactId, version: Option<&str>) -> Self {
        let version = version
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        Self {
            artifact_id,
            version,
        }
    }

    /// Return the artifact identifier component.
    #[must_use]
    pub const fn artifact_id(&self) -> &ArtifactId {
        &self.artifact_id
    }

    /// Return the version component.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Return the filename as a string without consuming the value.
    #[must_use]
    pub fn filename(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(
                f,
                "{}-{version}-{ARCHIVE_SUFFIX}{ARCHIVE_EXTENSION}",
                self.artifact_id
            ),
            None => write!(f, "{}-{ARCHIVE_SUFFIX}{ARCHIVE_EXTENSION}", self.artifact_id),
        }
    }
}
