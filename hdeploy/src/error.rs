//! Error types for job jar packaging and deployment.
//!
//! Every failure aborts the current operation. Variants carry enough context
//! to tell the user what to fix, and the `NotFound` variant points at the
//! command that produces the missing archive.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while packing or deploying a job jar.
#[derive(Debug, Error)]
pub enum DeployError {
    /// A required setting is missing or points at an unusable path.
    #[error("configuration error: {reason}")]
    Configuration {
        /// Description of the problem.
        reason: String,
    },

    /// The reference library directory is missing or unreadable.
    #[error("library directory {path} is not usable: {reason}")]
    LibraryDirectory {
        /// Path that was scanned.
        path: Utf8PathBuf,
        /// Description of the underlying failure.
        reason: String,
    },

    /// The project descriptor could not be read or parsed.
    #[error("invalid project descriptor at {path}: {reason}")]
    InvalidDescriptor {
        /// Path to the descriptor.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// Copying files into the staging root failed.
    #[error("staging failed: {reason}")]
    StagingFailed {
        /// Description of the staging failure.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Two archive entries or staged files resolve to the same path.
    #[error("duplicate entry {path}")]
    Conflict {
        /// The path that was produced twice.
        path: String,
    },

    /// The local archive expected by the deploy step does not exist.
    #[error("the archive {path} was not found; run `hdeploy pack` first")]
    NotFound {
        /// Where the archive was expected.
        path: Utf8PathBuf,
    },

    /// Streaming the archive to the remote filesystem failed.
    #[error("transfer to {destination} failed: {reason}")]
    Transfer {
        /// Destination URI of the upload.
        destination: String,
        /// Description of the remote failure.
        reason: String,
    },

    /// Failed to write command output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    /// Build a [`DeployError::Configuration`] from any displayable reason.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Returns true for errors in the configuration class.
    ///
    /// Descriptor, library directory, and plain configuration problems all
    /// mean the user must change an input before retrying.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::LibraryDirectory { .. }
                | Self::InvalidDescriptor { .. }
        )
    }
}

/// Result type alias using [`DeployError`].
pub type Result<T> = std::result::Result<T, DeployError>;
