//! WebHDFS REST backend for `hdfs://` and `webhdfs://` destinations.
//!
//! File creation is a two-step exchange: the name node answers the first
//! `PUT ?op=CREATE` with a `307 Temporary Redirect` naming a data node, and
//! the file content is sent to that location in a second `PUT`.

use super::{Destination, RemoteFileSystem};
use crate::error::{DeployError, Result};
use log::debug;
use std::io::{self, Read};
use std::sync::OnceLock;
use std::time::Duration;
use ureq::SendBody;
use url::Url;

/// Network timeout for a whole upload request.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

const REST_PREFIX: &str = "/webhdfs/v1";

/// Uploads files through a name node's WebHDFS endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebHdfsClient {
    host: String,
    port: u16,
    user: Option<String>,
}

impl WebHdfsClient {
    /// Create a client for the name node at `host:port`.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, user: Option<String>) -> Self {
        Self {
            host: host.into(),
            port,
            user,
        }
    }

    /// Build the `CREATE` request URL for an absolute filesystem path.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Configuration`] if the host cannot form a URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use hdeploy::upload::WebHdfsClient;
    ///
    /// let client = WebHdfsClient::new("nn", 9870, Some("etl".to_owned()));
    /// let url = client.create_url("/user/jobs/a.jar").expect("valid URL");
    /// assert_eq!(
    ///     url,
    ///     "http://nn:9870/webhdfs/v1/user/jobs/a.jar?op=CREATE&overwrite=true&user.name=etl"
    /// );
    /// ```
    pub fn create_url(&self, path: &str) -> Result<String> {
        let mut url = Url::parse(&format!("http://{}:{}/", self.host, self.port)).map_err(|e| {
            DeployError::configuration(format!("invalid WebHDFS host `{}`: {e}", self.host))
        })?;
        url.set_path(&format!("{REST_PREFIX}{path}"));
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("op", "CREATE");
            query.append_pair("overwrite", "true");
            if let Some(user) = &self.user {
                query.append_pair("user.name", user);
            }
        }
        Ok(url.into())
    }

    fn locate_data_node(&self, url: &str, destination: &Destination) -> Result<String> {
        let response = http_agent()
            .put(url)
            .send_empty()
            .map_err(|e| transfer_error(destination, e.to_string()))?;
        let status = response.status().as_u16();
        if status != 307 {
            return Err(unexpected_status(destination, status, response));
        }
        response
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| transfer_error(destination, "redirect without a location".to_owned()))
    }
}

impl RemoteFileSystem for WebHdfsClient {
    fn write_file(&self, destination: &Destination, source: &mut dyn Read) -> Result<u64> {
        let url = self.create_url(destination.path())?;
        let location = self.locate_data_node(&url, destination)?;
        debug!("WebHDFS redirected {destination} to {location}");

        let mut counting = CountingReader::new(source);
        let response = http_agent()
            .put(&location)
            .header("Content-Type", "application/octet-stream")
            .send(SendBody::from_reader(&mut counting))
            .map_err(|e| transfer_error(destination, e.to_string()))?;
        let status = response.status().as_u16();
        if status != 201 {
            return Err(unexpected_status(destination, status, response));
        }
        Ok(counting.count)
    }
}

struct CountingReader<'a> {
    inner: &'a mut dyn Read,
    count: u64,
}

impl<'a> CountingReader<'a> {
    fn new(inner: &'a mut dyn Read) -> Self {
        Self { inner, count: 0 }
    }
}

impl Read for CountingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += u64::try_from(n).unwrap_or(u64::MAX);
        Ok(n)
    }
}

/// Shared `ureq` agent: no automatic redirects, statuses inspected by hand.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(UPLOAD_TIMEOUT))
            .max_redirects(0)
            .max_redirects_will_error(false)
            .http_status_as_error(false)
            .build();
        ureq::Agent::new_with_config(config)
    })
}

fn unexpected_status(
    destination: &Destination,
    status: u16,
    response: ureq::http::Response<ureq::Body>,
) -> DeployError {
    let body = response
        .into_body()
        .read_to_string()
        .unwrap_or_default();
    let detail = body.trim();
    let reason = if detail.is_empty() {
        format!("unexpected HTTP status {status}")
    } else {
        format!("unexpected HTTP status {status}: {detail}")
    };
    transfer_error(destination, reason)
}

fn transfer_error(destination: &Destination, reason: String) -> DeployError {
    DeployError::Transfer {
        destination: destination.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::with_user(Some("etl"), "&user.name=etl")]
    #[case::without_user(None, "")]
    fn create_url_carries_operation_and_user(#[case] user: Option<&str>, #[case] suffix: &str) {
        let client = WebHdfsClient::new("nn", 9870, user.map(str::to_owned));
        let url = client.create_url("/user/jobs/a.jar").expect("valid URL");
        assert_eq!(
            url,
            format!("http://nn:9870/webhdfs/v1/user/jobs/a.jar?op=CREATE&overwrite=true{suffix}")
        );
    }

    #[test]
    fn create_url_escapes_path() {
        let client = WebHdfsClient::new("nn", 9870, None);
        let url = client.create_url("/user/my jobs/a.jar").expect("valid URL");
        assert!(url.contains("/webhdfs/v1/user/my%20jobs/a.jar"));
    }

    #[test]
    fn counting_reader_counts_bytes() {
        let mut source: &[u8] = b"0123456789";
        let mut counting = CountingReader::new(&mut source);
        let mut sink = Vec::new();
        io::copy(&mut counting, &mut sink).expect("copy succeeds");
        assert_eq!(counting.count, 10);
    }

    #[test]
    fn unreachable_name_node_is_a_transfer_error() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let client = WebHdfsClient::new("127.0.0.1", 9, None);
        let dest = Destination::parse("hdfs://127.0.0.1:8020/tmp").expect("valid URI");
        let err = client
            .write_file(&dest.join("a.jar"), &mut b"x".as_slice())
            .expect_err("no server");
        assert!(matches!(err, DeployError::Transfer { .. }));
    }
}
