//! Error types for archive assembly.
//!
//! Covers unreadable sources, ZIP writer failures, duplicate entry paths,
//! and paths that cannot be expressed as relative archive entries.

use crate::error::DeployError;
use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;
use zip::result::ZipError;

/// Errors arising while turning a staged tree into an archive.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// An I/O operation on the sink or the staged tree failed.
    #[error("I/O error during assembly: {0}")]
    Io(#[from] io::Error),

    /// A staged file or directory could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The unreadable path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The ZIP writer rejected an entry or could not finish the archive.
    #[error("archive write failed: {0}")]
    Zip(#[from] ZipError),

    /// Two entries resolve to the same archive path.
    #[error("duplicate archive entry {path}")]
    Conflict {
        /// The path that was produced twice.
        path: String,
    },

    /// A path cannot be represented as a relative archive entry.
    #[error("invalid entry path {path:?}: {reason}")]
    InvalidEntryPath {
        /// The offending path.
        path: String,
        /// The rule the path violates.
        reason: &'static str,
    },
}

impl From<AssemblyError> for DeployError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::Io(source) | AssemblyError::Zip(ZipError::Io(source)) => {
                Self::Io(source)
            }
            AssemblyError::Read { path, source } => Self::Io(io::Error::new(
                source.kind(),
                format!("failed to read {path}: {source}"),
            )),
            AssemblyError::Zip(other) => Self::Io(io::Error::other(other)),
            AssemblyError::Conflict { path } => Self::Conflict { path },
            AssemblyError::InvalidEntryPath { path, reason } => Self::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid entry path {path:?}: {reason}"),
            )),
        }
    }
}
