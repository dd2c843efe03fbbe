//! Upload destination URIs.

use crate::error::{DeployError, Result};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::fmt;
use url::Url;

/// A parsed `scheme://authority/path` destination.
///
/// User information, queries and fragments are dropped. The path is always
/// absolute and percent-decoded. Directory destinations are turned into file
/// destinations with [`Destination::join`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    url: Url,
    path: String,
}

impl Destination {
    /// Parse a destination URI.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Configuration`] if `raw` is not an absolute
    /// hierarchical URI, has a port that is not a number, or has a path that
    /// does not decode to UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// use hdeploy::upload::Destination;
    ///
    /// let dest = Destination::parse("hdfs://namenode:8020/user/jobs").expect("valid URI");
    /// assert_eq!(dest.scheme(), "hdfs");
    /// assert_eq!(dest.host(), "namenode");
    /// assert_eq!(dest.port(), Some(8020));
    /// assert_eq!(dest.path(), "/user/jobs");
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let mut url = Url::parse(raw).map_err(|err| invalid(raw, &err.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid(raw, "expected scheme://host/path"));
        }
        url.set_query(None);
        url.set_fragment(None);
        if !url.username().is_empty() || url.password().is_some() {
            url.set_password(None)
                .and_then(|()| url.set_username(""))
                .map_err(|()| invalid(raw, "credentials are not supported here"))?;
        }

        let path = decode_path(url.path()).ok_or_else(|| invalid(raw, "path is not UTF-8"))?;
        Ok(Self { url, path })
    }

    /// Return the lowercase scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Return the host, which may be empty for `file` URIs.
    ///
    /// IPv6 literals keep their brackets so the host can be placed straight
    /// into another URL.
    #[must_use]
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Return the explicit port, if any.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    /// Return the decoded absolute path component.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Return a destination for `name` inside this directory.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        let mut url = self.url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        let dir = self.path.trim_end_matches('/');
        Self {
            url,
            path: format!("{dir}/{name}"),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme(), self.host())?;
        if let Some(port) = self.port() {
            write!(f, ":{port}")?;
        }
        f.write_str(&self.path)
    }
}

fn decode_path(encoded: &str) -> Option<String> {
    if encoded.is_empty() {
        return Some("/".to_owned());
    }
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(Cow::into_owned)
}

fn invalid(raw: &str, reason: &str) -> DeployError {
    DeployError::configuration(format!("invalid deploy destination `{raw}`: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_name_node("hdfs://localhost:8020/", "hdfs", "localhost", Some(8020), "/")]
    #[case::no_path("webhdfs://nn:9870", "webhdfs", "nn", Some(9870), "/")]
    #[case::file_uri("file:///tmp/jobs", "file", "", None, "/tmp/jobs")]
    #[case::upper_scheme("HDFS://nn/user", "hdfs", "nn", None, "/user")]
    #[case::ipv6_literal("hdfs://[::1]:8020/jobs", "hdfs", "[::1]", Some(8020), "/jobs")]
    #[case::user_info("hdfs://etl@nn:8020/jobs", "hdfs", "nn", Some(8020), "/jobs")]
    #[case::query_dropped("hdfs://nn/jobs?x=1#frag", "hdfs", "nn", None, "/jobs")]
    #[case::encoded_space("file:///tmp/my%20jobs", "file", "", None, "/tmp/my jobs")]
    fn parses_components(
        #[case] raw: &str,
        #[case] scheme: &str,
        #[case] host: &str,
        #[case] port: Option<u16>,
        #[case] path: &str,
    ) {
        let dest = Destination::parse(raw).expect("valid URI");
        assert_eq!(dest.scheme(), scheme);
        assert_eq!(dest.host(), host);
        assert_eq!(dest.port(), port);
        assert_eq!(dest.path(), path);
    }

    #[rstest]
    #[case::no_scheme("/user/jobs")]
    #[case::empty_scheme("://host/path")]
    #[case::bad_port("hdfs://nn:http/")]
    #[case::not_hierarchical("mailto:etl@example.com")]
    fn rejects_malformed_uris(#[case] raw: &str) {
        let err = Destination::parse(raw).expect_err("must fail");
        assert!(err.is_configuration());
    }

    #[rstest]
    #[case::trailing_slash("hdfs://nn:8020/user/jobs/", "hdfs://nn:8020/user/jobs/a.jar")]
    #[case::no_trailing_slash("hdfs://nn:8020/user/jobs", "hdfs://nn:8020/user/jobs/a.jar")]
    #[case::root("hdfs://nn:8020/", "hdfs://nn:8020/a.jar")]
    fn join_appends_file_name(#[case] raw: &str, #[case] expected: &str) {
        let dest = Destination::parse(raw).expect("valid URI").join("a.jar");
        assert_eq!(dest.to_string(), expected);
    }

    #[rstest]
    #[case::user_info("hdfs://etl:secret@nn:8020/jobs?x=1", "hdfs://nn:8020/jobs/a.jar")]
    #[case::ipv6("webhdfs://[::1]:9870/jobs", "webhdfs://[::1]:9870/jobs/a.jar")]
    #[case::encoded("file:///tmp/my%20jobs/", "file:///tmp/my jobs/a.jar")]
    fn display_omits_credentials_and_query(#[case] raw: &str, #[case] expected: &str) {
        let dest = Destination::parse(raw).expect("valid URI").join("a.jar");
        assert_eq!(dest.to_string(), expected);
    }

    #[rstest]
    fn join_encodes_the_name_in_the_url() {
        let dest = Destination::parse("hdfs://nn/jobs")
            .expect("valid URI")
            .join("my job.jar");
        assert_eq!(dest.path(), "/jobs/my job.jar");
        assert_eq!(dest.url.path(), "/jobs/my%20job.jar");
    }
}
