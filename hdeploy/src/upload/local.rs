//! `file://` destinations.

use super::{Destination, RemoteFileSystem};
use crate::error::{DeployError, Result};
use camino::Utf8Path;
use log::debug;
use std::fs;
use std::io::{self, Read};
use tempfile::NamedTempFile;

/// Writes uploads to a locally mounted filesystem.
///
/// The file is written to a temporary sibling and renamed into place, so
/// readers never observe a partial upload.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl RemoteFileSystem for LocalFileSystem {
    fn write_file(&self, destination: &Destination, source: &mut dyn Read) -> Result<u64> {
        let target = Utf8Path::new(destination.path());
        write_atomically(target, source).map_err(|e| DeployError::Transfer {
            destination: destination.to_string(),
            reason: e.to_string(),
        })
    }
}

fn write_atomically(target: &Utf8Path, source: &mut dyn Read) -> io::Result<u64> {
    let parent = target
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"))?;
    fs::create_dir_all(parent)?;
    let mut temp = NamedTempFile::new_in(parent)?;
    let bytes = io::copy(source, temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| e.error)?;
    debug!("wrote {bytes} bytes to {target}");
    Ok(bytes)
}
