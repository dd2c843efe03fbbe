//! Exclusion of dependencies the runtime already provides.
//!
//! A dependency is left out of the job jar when its identifier starts with
//! one of the [`RESERVED_PREFIXES`] or appears verbatim in the
//! [`LibraryInventory`]. The prefix check catches runtime modules that are
//! not shipped as inventory files; the inventory check catches third-party
//! jars the runtime happens to bundle.

use crate::artifact_id::ArtifactId;
use crate::inventory::LibraryInventory;
use crate::project::{Artifact, DependencySet};
use std::fmt;

/// Identifier prefixes that always denote runtime-internal modules.
pub const RESERVED_PREFIXES: &[&str] = &["hadoop", "jsp-"];

/// Why a dependency was left out of the job jar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// The identifier starts with the given reserved prefix.
    ReservedPrefix(&'static str),
    /// The identifier appears in the runtime's library inventory.
    ProvidedByRuntime,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservedPrefix(prefix) => write!(f, "reserved prefix `{prefix}`"),
            Self::ProvidedByRuntime => f.write_str("provided by the runtime classpath"),
        }
    }
}

/// Decide whether `id` must be excluded, and why.
///
/// The prefix check runs first, so an identifier matching both rules reports
/// [`ExclusionReason::ReservedPrefix`].
#[must_use]
pub fn exclusion_reason(id: &ArtifactId, inventory: &LibraryInventory) -> Option<ExclusionReason> {
    if let Some(prefix) = RESERVED_PREFIXES.iter().copied().find(|p| id.starts_with(p)) {
        return Some(ExclusionReason::ReservedPrefix(prefix));
    }
    inventory
        .contains(id)
        .then_some(ExclusionReason::ProvidedByRuntime)
}

/// Result of splitting a dependency set into packaged and excluded parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Dependencies that must ship inside the job jar.
    pub retained: DependencySet,
    /// Dependencies left out, with the rule that excluded each one.
    pub excluded: Vec<(Artifact, ExclusionReason)>,
}

/// Split `dependencies` into retained and excluded artifacts.
#[must_use]
pub fn partition_dependencies(
    dependencies: &DependencySet,
    inventory: &LibraryInventory,
) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    for artifact in dependencies {
        match exclusion_reason(&artifact.identifier, inventory) {
            Some(reason) => outcome.excluded.push((artifact.clone(), reason)),
            None => {
                outcome.retained.insert(artifact.clone());
            }
        }
    }
    outcome
}

/// Return the dependencies that are not already provided by the runtime.
///
/// Pure and idempotent: filtering an already-filtered set returns it
/// unchanged.
///
/// # Examples
///
/// ```
/// use hdeploy::artifact_id::ArtifactId;
/// use hdeploy::filter::filter_dependencies;
/// use hdeploy::inventory::LibraryInventory;
/// use hdeploy::project::{Artifact, DependencySet};
///
/// let inventory: LibraryInventory = [ArtifactId::from("commons-logging")].into_iter().collect();
/// let candidates: DependencySet = [
///     Artifact::archive("hadoop-core", "/repo/hadoop-core-1.0.0.jar"),
///     Artifact::archive("commons-logging", "/repo/commons-logging-1.1.jar"),
///     Artifact::archive("guava", "/repo/guava-31.1.jar"),
/// ]
/// .into_iter()
/// .collect();
///
/// let filtered = filter_dependencies(&candidates, &inventory);
/// assert_eq!(filtered.identifiers(), "guava");
/// ```
#[must_use]
pub fn filter_dependencies(
    dependencies: &DependencySet,
    inventory: &LibraryInventory,
) -> DependencySet {
    partition_dependencies(dependencies, inventory).retained
}
