//! Upload of a packed job jar to a distributed filesystem.
//!
//! The remote side is reached through the [`RemoteFileSystem`] trait so the
//! upload logic can be exercised without a cluster. Two backends are
//! provided: [`LocalFileSystem`] for `file://` destinations and
//! [`WebHdfsClient`] for `hdfs://` and `webhdfs://` destinations.

mod destination;
mod local;
mod webhdfs;

pub use destination::Destination;
pub use local::LocalFileSystem;
pub use webhdfs::WebHdfsClient;

use crate::config::DEFAULT_WEBHDFS_PORT;
use crate::error::{DeployError, Result};
use camino::Utf8Path;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, Read};

/// Writes a byte stream to a file on a remote filesystem.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteFileSystem {
    /// Stream `source` to `destination`, replacing any existing file.
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Transfer`] if the remote write fails.
    fn write_file(&self, destination: &Destination, source: &mut dyn Read) -> Result<u64>;
}

/// Outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    /// Full URI of the uploaded file.
    pub destination: String,
    /// Bytes transferred.
    pub bytes: u64,
}

/// Connection settings for the remote backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOptions {
    /// User name sent with WebHDFS requests.
    pub user: Option<String>,
    /// HTTP port used for `hdfs://` destinations.
    pub webhdfs_port: u16,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            user: None,
            webhdfs_port: DEFAULT_WEBHDFS_PORT,
        }
    }
}

/// Upload `local_archive` into the directory `destination`.
///
/// The archive is opened before the remote filesystem is contacted, so a
/// missing archive never results in a remote call. The local file is never
/// modified.
///
/// # Errors
///
/// Returns [`DeployError::NotFound`] if the archive does not exist,
/// [`DeployError::Io`] if it cannot be opened, and any error from the
/// remote write.
pub fn upload(
    local_archive: &Utf8Path,
    destination: &Destination,
    remote: &dyn RemoteFileSystem,
) -> Result<UploadReport> {
    let file = File::open(local_archive).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DeployError::NotFound {
            path: local_archive.to_owned(),
        },
        _ => DeployError::Io(e),
    })?;
    let Some(file_name) = local_archive.file_name() else {
        return Err(DeployError::NotFound {
            path: local_archive.to_owned(),
        });
    };

    let target = destination.join(file_name);
    info!("uploading {local_archive} to {target}");
    let bytes = remote.write_file(&target, &mut BufReader::new(file))?;
    Ok(UploadReport {
        destination: target.to_string(),
        bytes,
    })
}

/// Pick the backend that serves `destination`'s scheme.
///
/// # Errors
///
/// Returns [`DeployError::Configuration`] for unsupported schemes.
pub fn remote_for(
    destination: &Destination,
    options: &RemoteOptions,
) -> Result<Box<dyn RemoteFileSystem>> {
    match destination.scheme() {
        "file" => Ok(Box::new(LocalFileSystem)),
        "hdfs" => Ok(Box::new(WebHdfsClient::new(
            host_or_localhost(destination),
            options.webhdfs_port,
            options.user.clone(),
        ))),
        "webhdfs" => Ok(Box::new(WebHdfsClient::new(
            host_or_localhost(destination),
            destination.port().unwrap_or(options.webhdfs_port),
            options.user.clone(),
        ))),
        other => Err(DeployError::configuration(format!(
            "unsupported deploy scheme `{other}`; use hdfs, webhdfs or file"
        ))),
    }
}

fn host_or_localhost(destination: &Destination) -> String {
    if destination.host().is_empty() {
        "localhost".to_owned()
    } else {
        destination.host().to_owned()
    }
}
