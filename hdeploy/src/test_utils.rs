//! Shared test utilities for the hdeploy crate.

use crate::error::{DeployError, Result};
use crate::upload::{Destination, RemoteFileSystem};
use std::cell::RefCell;
use std::io::Read;

/// A file captured by [`RecordingFileSystem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    /// Destination URI of the write.
    pub destination: String,
    /// Bytes that were streamed.
    pub contents: Vec<u8>,
}

/// A `RemoteFileSystem` that keeps uploads in memory.
///
/// Lets tests verify what would have been sent to a cluster without any
/// network access.
#[derive(Debug, Default)]
pub struct RecordingFileSystem {
    writes: RefCell<Vec<RecordedWrite>>,
}

impl RecordingFileSystem {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every write seen so far, in call order.
    #[must_use]
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.borrow().clone()
    }

    /// Returns the number of writes seen so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.writes.borrow().len()
    }
}

impl RemoteFileSystem for RecordingFileSystem {
    fn write_file(&self, destination: &Destination, source: &mut dyn Read) -> Result<u64> {
        let mut contents = Vec::new();
        source.read_to_end(&mut contents)?;
        let bytes = u64::try_from(contents.len()).unwrap_or(u64::MAX);
        self.writes.borrow_mut().push(RecordedWrite {
            destination: destination.to_string(),
            contents,
        });
        Ok(bytes)
    }
}

/// A `RemoteFileSystem` whose writes always fail with a transfer error.
#[derive(Debug, Clone)]
pub struct FailingFileSystem {
    reason: String,
}

impl FailingFileSystem {
    /// Creates a remote that fails with `reason`.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl RemoteFileSystem for FailingFileSystem {
    fn write_file(&self, destination: &Destination, _source: &mut dyn Read) -> Result<u64> {
        Err(DeployError::Transfer {
            destination: destination.to_string(),
            reason: self.reason.clone(),
        })
    }
}
