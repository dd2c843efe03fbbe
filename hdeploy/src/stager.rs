//! File staging.
//!
//! This module builds the staging root that mirrors the final archive
//! layout: the project's compiled output at the top level and every packaged
//! dependency under `lib/`. File modification times are carried over so the
//! archive records when each class was built.

use crate::error::{DeployError, Result};
use crate::project::{Artifact, DependencySet};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace, warn};
use std::fs::{self, File, OpenOptions};
use std::io;

/// Name of the dependency directory inside the staging root.
pub const LIB_DIR: &str = "lib";

/// What ended up in the staging root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedLayout {
    /// The staging root.
    pub root: Utf8PathBuf,
    /// Files copied from the build output.
    pub build_files: usize,
    /// Staged dependency archives, in copy order.
    pub libraries: Vec<Utf8PathBuf>,
}

impl StagedLayout {
    /// Return the dependency directory.
    #[must_use]
    pub fn lib_dir(&self) -> Utf8PathBuf {
        self.root.join(LIB_DIR)
    }
}

/// Handles staging of build output and dependencies.
pub struct Stager {
    root: Utf8PathBuf,
}

impl Stager {
    /// Create a stager writing into `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Return the staging root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Delete any previous staging root and create an empty one with `lib/`.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::StagingFailed`] if the directory cannot be
    /// removed or created.
    pub fn prepare(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(|e| {
                staging_error(format!("failed to clear {}: {e}", self.root))
            })?;
        }
        let lib = self.root.join(LIB_DIR);
        fs::create_dir_all(&lib)
            .map_err(|e| staging_error(format!("failed to create {lib}: {e}")))
    }

    /// Copy the contents of `build_output` into the staging root.
    ///
    /// A missing build output directory is treated as empty. Returns the
    /// number of files copied.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::StagingFailed`] if a file cannot be copied and
    /// [`DeployError::Conflict`] if a build output file collides with one
    /// already staged.
    pub fn stage_build_output(&self, build_output: &Utf8Path) -> Result<usize> {
        if !build_output.exists() {
            warn!("build output {build_output} does not exist; packaging dependencies only");
            return Ok(0);
        }
        if !build_output.is_dir() {
            return Err(staging_error(format!(
                "build output {build_output} is not a directory"
            )));
        }
        copy_tree(build_output, &self.root, Utf8Path::new(""))
    }

    /// Copy one dependency archive into `lib/`, keeping its filename.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Conflict`] if a file of the same name is
    /// already staged, and [`DeployError::StagingFailed`] if the artifact has
    /// no filename or cannot be copied.
    pub fn stage_dependency(&self, artifact: &Artifact) -> Result<Utf8PathBuf> {
        let Some(file_name) = artifact.file_name() else {
            return Err(staging_error(format!(
                "dependency {} has no file name",
                artifact.identifier
            )));
        };
        let dest = self.root.join(LIB_DIR).join(file_name);
        if dest.exists() {
            return Err(DeployError::Conflict {
                path: format!("{LIB_DIR}/{file_name}"),
            });
        }
        copy_file(&artifact.file, &dest)?;
        trace!("staged {} as {dest}", artifact.identifier);
        Ok(dest)
    }

    /// Stage every dependency of `dependencies`.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`Stager::stage_dependency`].
    pub fn stage_dependencies(&self, dependencies: &DependencySet) -> Result<Vec<Utf8PathBuf>> {
        dependencies
            .iter()
            .map(|artifact| self.stage_dependency(artifact))
            .collect()
    }
}

/// Recreate `staging_root` from `build_output` and `dependencies`.
///
/// # Errors
///
/// Returns any error from preparing the root or copying files into it.
pub fn stage(
    build_output: &Utf8Path,
    dependencies: &DependencySet,
    staging_root: &Utf8Path,
) -> Result<StagedLayout> {
    let stager = Stager::new(staging_root);
    stager.prepare()?;
    let build_files = stager.stage_build_output(build_output)?;
    let libraries = stager.stage_dependencies(dependencies)?;
    debug!(
        "staged {build_files} build files and {} libraries into {staging_root}",
        libraries.len()
    );
    Ok(StagedLayout {
        root: staging_root.to_owned(),
        build_files,
        libraries,
    })
}

/// Copy `source` into `root/relative`. Conflicts are reported relative to
/// `root`. Symlinked directories are skipped.
fn copy_tree(source: &Utf8Path, root: &Utf8Path, relative: &Utf8Path) -> Result<usize> {
    let mut copied = 0;
    let entries = source
        .read_dir_utf8()
        .map_err(|e| staging_error(format!("failed to list {source}: {e}")))?;
    for entry in entries {
        let entry = entry.map_err(|e| staging_error(format!("failed to list {source}: {e}")))?;
        let from = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| staging_error(format!("failed to inspect {from}: {e}")))?;
        if file_type.is_symlink() && from.is_dir() {
            warn!("not following symlinked directory {from}");
            continue;
        }

        let staged = relative.join(entry.file_name());
        let to = root.join(&staged);
        if file_type.is_dir() {
            fs::create_dir_all(&to)
                .map_err(|e| staging_error(format!("failed to create {to}: {e}")))?;
            copied += copy_tree(from, root, &staged)?;
        } else {
            if to.exists() {
                return Err(DeployError::Conflict {
                    path: staged.into_string(),
                });
            }
            copy_file(from, &to)?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn copy_file(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    fs::copy(from, to)
        .map_err(|e| staging_error(format!("failed to copy {from} to {to}: {e}")))?;
    preserve_modified(from, to)
        .map_err(|e| staging_error(format!("failed to set modification time of {to}: {e}")))
}

fn preserve_modified(from: &Utf8Path, to: &Utf8Path) -> io::Result<()> {
    let modified = File::open(from)?.metadata()?.modified()?;
    OpenOptions::new().write(true).open(to)?.set_modified(modified)
}

fn staging_error(reason: String) -> DeployError {
    DeployError::StagingFailed { reason }
}
