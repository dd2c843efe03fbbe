//! Packaging pipeline orchestration.
//!
//! This module ties the pieces together: it computes the runtime library
//! inventory, filters the project's dependencies, stages the archive layout,
//! and serializes it into the job jar. The archive is written to a temporary
//! file next to its final location and only renamed into place once it is
//! complete.

use crate::archive::{ArchiveManifest, ArchiveSummary, assemble};
use crate::error::{DeployError, Result};
use crate::filter::{FilterOutcome, partition_dependencies};
use crate::inventory::compute_library_inventory;
use crate::project::{Artifact, DependencySet, Project};
use crate::stager::stage;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use log::{debug, info};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read};
use tempfile::NamedTempFile;

/// Name of the runtime's library directory below its home.
pub const RUNTIME_LIB_DIR: &str = "lib";

/// A dependency left out of the job jar, with the rule that excluded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedDependency {
    /// The excluded artifact.
    pub artifact: Artifact,
    /// Human-readable exclusion rule.
    pub reason: String,
}

/// Everything a packaging run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackOutput {
    /// Location of the job jar.
    pub archive: Utf8PathBuf,
    /// Lowercase hex SHA-256 of the job jar.
    pub sha256: String,
    /// Entry counts of the archive.
    pub summary: ArchiveSummary,
    /// Entry point recorded in the manifest.
    pub main_class: Option<String>,
    /// Dependencies packaged under `lib/`.
    pub retained: DependencySet,
    /// Dependencies left to the runtime.
    pub excluded: Vec<ExcludedDependency>,
    /// Shell command that submits the job.
    pub run_command: String,
}

/// Compute which dependencies `project` ships, without writing anything.
///
/// # Errors
///
/// Returns [`DeployError::LibraryDirectory`] if `<hadoop_home>/lib` is
/// missing or unreadable.
pub fn plan(project: &Project, hadoop_home: &Utf8Path) -> Result<FilterOutcome> {
    let inventory = compute_library_inventory(&hadoop_home.join(RUNTIME_LIB_DIR))?;
    let outcome = partition_dependencies(&project.dependencies, &inventory);
    for (artifact, reason) in &outcome.excluded {
        info!("ignoring {} ({reason})", artifact.identifier);
    }
    debug!("packaging dependencies: [{}]", outcome.retained.identifiers());
    Ok(outcome)
}

/// Build the job jar for `project`.
///
/// The output directory is deleted and recreated first, so nothing from a
/// previous run survives.
///
/// # Errors
///
/// Returns [`DeployError::Configuration`] if `hadoop_home` is not set or the
/// output directory overlaps the build output, and propagates inventory,
/// staging and assembly failures.
pub fn pack(
    project: &Project,
    hadoop_home: Option<&Utf8Path>,
    main_class: Option<&str>,
) -> Result<PackOutput> {
    let hadoop_home = require_hadoop_home(hadoop_home)?;
    check_layout(project)?;

    let outcome = plan(project, hadoop_home)?;
    let had_classes = project.classes_directory.is_dir();
    recreate_dir(&project.output_directory)?;
    if had_classes && !project.classes_directory.is_dir() {
        return Err(DeployError::configuration(format!(
            "build output {} was removed while recreating {}",
            project.classes_directory, project.output_directory
        )));
    }

    let layout = stage(
        &project.classes_directory,
        &outcome.retained,
        &project.staging_root(),
    )?;

    let archive = project.archive_path();
    let manifest = ArchiveManifest::new(main_class);

    let mut temp = NamedTempFile::new_in(&project.output_directory)?;
    let summary = assemble(&layout.root, &manifest, temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(&archive).map_err(|e| DeployError::Io(e.error))?;
    info!("wrote {archive} ({} entries)", summary.entry_count());

    let sha256 = compute_sha256(&archive)?;
    let run_command = run_command(hadoop_home, &archive, manifest.main_class());
    let excluded = outcome
        .excluded
        .into_iter()
        .map(|(artifact, reason)| ExcludedDependency {
            artifact,
            reason: reason.to_string(),
        })
        .collect();

    Ok(PackOutput {
        archive,
        sha256,
        summary,
        main_class: manifest.main_class().map(str::to_owned),
        retained: outcome.retained,
        excluded,
        run_command,
    })
}

/// Unwrap the runtime home, or explain how to set it.
///
/// # Errors
///
/// Returns [`DeployError::Configuration`] when `hadoop_home` is `None`.
pub fn require_hadoop_home(hadoop_home: Option<&Utf8Path>) -> Result<&Utf8Path> {
    hadoop_home.ok_or_else(|| {
        DeployError::configuration(
            "the Hadoop home directory is not set; pass --hadoop-home or set HADOOP_HOME",
        )
    })
}

/// Format the command that submits the packed job to the runtime.
#[must_use]
pub fn run_command(hadoop_home: &Utf8Path, archive: &Utf8Path, main_class: Option<&str>) -> String {
    let launcher = hadoop_home.join("bin").join("hadoop");
    match main_class {
        Some(class) => format!("{launcher} jar {archive} {class}"),
        None => format!("{launcher} jar {archive}"),
    }
}

/// Compute the lowercase hex SHA-256 of the file at `path`.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn compute_sha256(path: &Utf8Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn check_layout(project: &Project) -> Result<()> {
    let output = comparable_path(&project.output_directory)?;
    let classes = comparable_path(&project.classes_directory)?;
    if classes.starts_with(&output) || output.starts_with(&classes) {
        return Err(DeployError::configuration(format!(
            "output directory {} overlaps the build output {}",
            project.output_directory, project.classes_directory
        )));
    }
    Ok(())
}

/// Absolute, normalized form of `path` with its longest existing ancestor
/// resolved through symlinks.
fn comparable_path(path: &Utf8Path) -> io::Result<Utf8PathBuf> {
    let absolute = Utf8PathBuf::try_from(std::path::absolute(path)?)
        .map_err(camino::FromPathBufError::into_io_error)?;
    let absolute = normalize(&absolute);

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(mut resolved) = existing.canonicalize_utf8() {
            for name in missing.iter().rev() {
                resolved.push(name);
            }
            return Ok(resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return Ok(absolute.clone()),
        }
    }
}

/// Drop `.` components and fold `..` into the preceding component.
fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

fn recreate_dir(dir: &Utf8Path) -> Result<()> {
    if dir.exists() {
        debug!("removing previous output {dir}");
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
