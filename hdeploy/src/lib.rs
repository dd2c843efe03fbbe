//! hdeploy library.
//!
//! This crate packages a compiled Hadoop MapReduce project into a single job
//! jar and uploads it to a distributed filesystem. Dependencies that the
//! Hadoop runtime already provides are left out of the jar. It is used by
//! the `hdeploy` CLI binary and can be driven programmatically from tests or
//! other build tooling.
//!
//! # Modules
//!
//! - [`archive`] - Lazy directory walking and ZIP serialization with a manifest
//! - [`artifact_id`] - Semantic wrapper for dependency identifiers
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - `hdeploy.toml` project descriptor loading
//! - [`error`] - Semantic error types
//! - [`filter`] - Exclusion of dependencies provided by the runtime
//! - [`inventory`] - Inventory of the runtime's library directory
//! - [`naming`] - Job jar naming policy
//! - [`output`] - Human-readable report formatting
//! - [`pipeline`] - Pack orchestration: filter, stage, assemble
//! - [`project`] - Project model and dependency-resolution seam
//! - [`stager`] - Copying build output and dependencies into the staging tree
//! - [`upload`] - Upload of the job jar to `hdfs://`, `webhdfs://` or `file://`

pub mod archive;
pub mod artifact_id;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod inventory;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod project;
pub mod stager;
pub mod upload;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
