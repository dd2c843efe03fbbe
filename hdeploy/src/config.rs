//! Project descriptor loader.
//!
//! A project is described by `hdeploy.toml`:
//!
//! ```toml
//! [project]
//! artifact-id = "wordcount"
//! version = "1.0"
//! build-dir = "build"
//!
//! [[dependencies]]
//! id = "guava"
//! file = "libs/guava-31.1.jar"
//!
//! [pack]
//! hadoop-home = "/opt/hadoop"
//! main-class = "com.example.WordCount"
//!
//! [deploy]
//! path = "hdfs://namenode:8020/user/jobs"
//! user = "etl"
//! ```
//!
//! Relative paths are resolved against the directory holding the descriptor.
//! Command-line flags take precedence over descriptor values, which take
//! precedence over the environment.

use crate::artifact_id::ArtifactId;
use crate::error::{DeployError, Result};
use crate::naming::ArchiveName;
use crate::project::{
    ARCHIVE_KIND, Artifact, DependencyResolver, DependencySet, Project, ProjectLayout,
};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use serde::Deserialize;
use std::fs;

/// Descriptor filename looked up in the working directory.
pub const DEFAULT_DESCRIPTOR: &str = "hdeploy.toml";

/// Environment variable consulted when no Hadoop home is configured.
pub const HADOOP_HOME_ENV: &str = "HADOOP_HOME";

/// Default upload destination.
pub const DEFAULT_DEPLOY_PATH: &str = "hdfs://localhost:8020/";

/// Default WebHDFS HTTP port of the name node.
pub const DEFAULT_WEBHDFS_PORT: u16 = 9870;

const DEFAULT_BUILD_DIR: &str = "build";
const CLASSES_DIR: &str = "classes";
const OUTPUT_DIR: &str = "hadoop-deploy";

/// The parsed contents of `hdeploy.toml`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Descriptor {
    /// Identity and build layout of the project.
    pub project: ProjectSection,
    /// Resolved dependencies, in any order.
    pub dependencies: Vec<DependencyEntry>,
    /// Packaging settings.
    pub pack: PackSection,
    /// Upload settings.
    pub deploy: DeploySection,
    #[serde(skip)]
    base_dir: Utf8PathBuf,
}

/// The `[project]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ProjectSection {
    /// The project's artifact identifier. Required.
    pub artifact_id: String,
    /// The project version, if any.
    pub version: Option<String>,
    /// Build directory; defaults to `build`.
    pub build_dir: Option<Utf8PathBuf>,
    /// Compiled output; defaults to `<build-dir>/classes`.
    pub classes_dir: Option<Utf8PathBuf>,
    /// Packaging output; defaults to `<build-dir>/hadoop-deploy`.
    pub output_dir: Option<Utf8PathBuf>,
}

/// One `[[dependencies]]` entry.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DependencyEntry {
    /// Version-less identifier.
    pub id: String,
    /// Resolved file backing the dependency.
    pub file: Utf8PathBuf,
    /// Artifact type; defaults to `jar`.
    #[serde(default = "DependencyEntry::default_kind")]
    pub kind: String,
}

impl DependencyEntry {
    fn default_kind() -> String {
        ARCHIVE_KIND.to_owned()
    }
}

/// The `[pack]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct PackSection {
    /// Installation directory of the runtime.
    pub hadoop_home: Option<Utf8PathBuf>,
    /// Entry point written to the manifest.
    pub main_class: Option<String>,
}

/// The `[deploy]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct DeploySection {
    /// Destination directory URI.
    pub path: Option<String>,
    /// Remote user name for WebHDFS requests.
    pub user: Option<String>,
    /// HTTP port of the WebHDFS endpoint.
    pub webhdfs_port: Option<u16>,
}

impl Descriptor {
    /// Read and parse the descriptor at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Configuration`] if the file does not exist and
    /// [`DeployError::InvalidDescriptor`] if it cannot be read or parsed.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        if !path.exists() {
            return Err(DeployError::configuration(format!(
                "project descriptor {path} not found"
            )));
        }
        let contents = fs::read_to_string(path).map_err(|e| invalid(path, e.to_string()))?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_str().is_empty())
            .map_or_else(|| Utf8PathBuf::from("."), Utf8Path::to_owned);
        Self::parse(&contents, path, base_dir)
    }

    /// Parse descriptor contents, resolving relative paths against
    /// `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidDescriptor`] on TOML errors, unknown
    /// fields, or a blank artifact id.
    pub fn parse(contents: &str, path: &Utf8Path, base_dir: Utf8PathBuf) -> Result<Self> {
        let mut descriptor: Self =
            toml::from_str(contents).map_err(|e| invalid(path, format!("TOML parse error: {e}")))?;
        if descriptor.project.artifact_id.trim().is_empty() {
            return Err(invalid(path, "`project.artifact-id` is required".to_owned()));
        }
        descriptor.base_dir = base_dir;
        Ok(descriptor)
    }

    /// Resolve `path` against the descriptor's directory.
    #[must_use]
    pub fn resolve_path(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Compute the build directories, applying defaults.
    #[must_use]
    pub fn layout(&self) -> ProjectLayout {
        let section = &self.project;
        let build_dir = self.resolve_path(
            section
                .build_dir
                .as_deref()
                .unwrap_or(Utf8Path::new(DEFAULT_BUILD_DIR)),
        );
        ProjectLayout {
            classes_directory: section
                .classes_dir
                .as_deref()
                .map_or_else(|| build_dir.join(CLASSES_DIR), |p| self.resolve_path(p)),
            output_directory: section
                .output_dir
                .as_deref()
                .map_or_else(|| build_dir.join(OUTPUT_DIR), |p| self.resolve_path(p)),
        }
    }

    /// Build the project model, resolving dependencies from the descriptor.
    ///
    /// # Errors
    ///
    /// Propagates resolver errors.
    pub fn project(&self) -> Result<Project> {
        Project::resolve_with(
            ArtifactId::from(self.project.artifact_id.trim()),
            self.project.version.clone(),
            self.layout(),
            &DescriptorResolver::new(self),
        )
    }

    /// Return where `hdeploy pack` writes the job jar, without resolving
    /// dependencies. `output_dir` is a command-line override of the
    /// descriptor's output directory.
    #[must_use]
    pub fn archive_path(&self, output_dir: Option<&Utf8Path>) -> Utf8PathBuf {
        let name = ArchiveName::new(
            ArtifactId::from(self.project.artifact_id.trim()),
            self.project.version.as_deref(),
        );
        output_dir
            .map_or_else(|| self.layout().output_directory, Utf8Path::to_owned)
            .join(name.filename())
    }

    /// Pick the Hadoop home: `cli`, then the descriptor, then `env`.
    #[must_use]
    pub fn hadoop_home(&self, cli: Option<&Utf8Path>, env: Option<&str>) -> Option<Utf8PathBuf> {
        cli.map(Utf8Path::to_owned)
            .or_else(|| self.pack.hadoop_home.as_deref().map(|p| self.resolve_path(p)))
            .or_else(|| {
                env.map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(Utf8PathBuf::from)
            })
    }

    /// Pick the main class: `cli`, then the descriptor.
    #[must_use]
    pub fn main_class<'a>(&'a self, cli: Option<&'a str>) -> Option<&'a str> {
        cli.or(self.pack.main_class.as_deref())
    }

    /// Pick the upload destination: `cli`, the descriptor, then the default.
    #[must_use]
    pub fn deploy_path<'a>(&'a self, cli: Option<&'a str>) -> &'a str {
        cli.or(self.deploy.path.as_deref())
            .unwrap_or(DEFAULT_DEPLOY_PATH)
    }
}

/// Reads the `[[dependencies]]` list of a descriptor.
///
/// Only archive dependencies whose files exist are returned; anything else
/// is skipped with a warning.
pub struct DescriptorResolver<'a> {
    descriptor: &'a Descriptor,
}

impl<'a> DescriptorResolver<'a> {
    /// Create a resolver over `descriptor`.
    #[must_use]
    pub const fn new(descriptor: &'a Descriptor) -> Self {
        Self { descriptor }
    }
}

impl DependencyResolver for DescriptorResolver<'_> {
    fn resolve(&self) -> Result<DependencySet> {
        let mut set = DependencySet::new();
        for entry in &self.descriptor.dependencies {
            if entry.kind != ARCHIVE_KIND {
                warn!("skipping dependency {} of type {}", entry.id, entry.kind);
                continue;
            }
            let file = self.descriptor.resolve_path(&entry.file);
            if !file.is_file() {
                warn!("skipping dependency {}: {file} does not exist", entry.id);
                continue;
            }
            set.insert(Artifact::archive(entry.id.as_str(), file));
        }
        debug!("resolved {} dependencies", set.len());
        Ok(set)
    }
}

fn invalid(path: &Utf8Path, reason: String) -> DeployError {
    DeployError::InvalidDescriptor {
        path: path.to_owned(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    const MINIMAL: &str = "[project]\nartifact-id = \"wordcount\"\n";

    fn parse(source: &str) -> Result<Descriptor> {
        Descriptor::parse(
            source,
            Utf8Path::new("/work/hdeploy.toml"),
            Utf8PathBuf::from("/work"),
        )
    }

    #[fixture]
    fn minimal() -> Descriptor {
        parse(MINIMAL).expect("expected configuration to parse successfully")
    }

    #[rstest]
    fn layout_defaults_to_build_directory(minimal: Descriptor) {
        let layout = minimal.layout();
        assert_eq!(layout.classes_directory, Utf8Path::new("/work/build/classes"));
        assert_eq!(
            layout.output_directory,
            Utf8Path::new("/work/build/hadoop-deploy")
        );
    }

    #[rstest]
    fn explicit_directories_override_defaults() {
        let source = concat!(
            "[project]\n",
            "artifact-id = \"etl\"\n",
            "build-dir = \"target\"\n",
            "classes-dir = \"/abs/classes\"\n",
        );
        let layout = parse(source).expect("parses").layout();
        assert_eq!(layout.classes_directory, Utf8Path::new("/abs/classes"));
        assert_eq!(
            layout.output_directory,
            Utf8Path::new("/work/target/hadoop-deploy")
        );
    }

    #[rstest]
    fn rejects_unknown_fields() {
        let outcome = parse("[project]\nartifact-id = \"a\"\nunexpected = true\n");
        assert!(matches!(outcome, Err(DeployError::InvalidDescriptor { .. })));
    }

    #[rstest]
    #[case::missing("[pack]\nmain-class = \"a.Main\"\n")]
    #[case::blank("[project]\nartifact-id = \"  \"\n")]
    fn artifact_id_is_required(#[case] source: &str) {
        let err = parse(source).expect_err("must fail");
        assert!(err.is_configuration());
        assert!(err.to_string().contains("artifact-id"));
    }

    #[rstest]
    fn dependency_kind_defaults_to_jar() {
        let source = format!("{MINIMAL}[[dependencies]]\nid = \"guava\"\nfile = \"libs/guava.jar\"\n");
        let descriptor = parse(&source).expect("parses");
        let kinds: Vec<&str> = descriptor
            .dependencies
            .iter()
            .map(|d| d.kind.as_str())
            .collect();
        assert_eq!(kinds, vec!["jar"]);
    }

    #[rstest]
    #[case::cli_wins(Some("/cli"), Some("/env"), "/cli")]
    #[case::descriptor_over_env(None, Some("/env"), "/work/hadoop")]
    fn hadoop_home_precedence(
        #[case] cli: Option<&str>,
        #[case] env: Option<&str>,
        #[case] expected: &str,
    ) {
        let source = format!("{MINIMAL}[pack]\nhadoop-home = \"hadoop\"\n");
        let descriptor = parse(&source).expect("parses");
        let home = descriptor.hadoop_home(cli.map(Utf8Path::new), env);
        assert_eq!(home, Some(Utf8PathBuf::from(expected)));
    }

    #[rstest]
    fn hadoop_home_falls_back_to_environment(minimal: Descriptor) {
        assert_eq!(
            minimal.hadoop_home(None, Some("/opt/hadoop")),
            Some(Utf8PathBuf::from("/opt/hadoop"))
        );
        assert_eq!(minimal.hadoop_home(None, Some("  ")), None);
        assert_eq!(minimal.hadoop_home(None, None), None);
    }

    #[rstest]
    fn deploy_path_defaults_to_local_name_node(minimal: Descriptor) {
        assert_eq!(minimal.deploy_path(None), DEFAULT_DEPLOY_PATH);
        assert_eq!(minimal.deploy_path(Some("file:///tmp/jobs")), "file:///tmp/jobs");
    }

    #[rstest]
    #[case::versioned("version = \"1.0\"\n", "/work/build/hadoop-deploy/wordcount-1.0-hdeploy.jar")]
    #[case::unversioned("", "/work/build/hadoop-deploy/wordcount-hdeploy.jar")]
    fn archive_path_uses_output_directory(#[case] extra: &str, #[case] expected: &str) {
        let descriptor = parse(&format!("{MINIMAL}{extra}")).expect("parses");
        assert_eq!(descriptor.archive_path(None), Utf8PathBuf::from(expected));
    }

    #[rstest]
    fn archive_path_prefers_cli_output_directory(minimal: Descriptor) {
        assert_eq!(
            minimal.archive_path(Some(Utf8Path::new("/tmp/out"))),
            Utf8PathBuf::from("/tmp/out/wordcount-hdeploy.jar")
        );
    }

    #[rstest]
    fn main_class_prefers_cli() {
        let source = format!("{MINIMAL}[pack]\nmain-class = \"a.FromFile\"\n");
        let descriptor = parse(&source).expect("parses");
        assert_eq!(descriptor.main_class(Some("a.FromCli")), Some("a.FromCli"));
        assert_eq!(descriptor.main_class(None), Some("a.FromFile"));
    }

    #[rstest]
    fn resolver_keeps_existing_archives_only() {
        let dir = TempDir::new().expect("temp dir creation succeeds");
        let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("temp dir is UTF-8");
        fs::create_dir_all(base.join("libs")).expect("mkdir");
        fs::write(base.join("libs/guava-31.1.jar"), b"").expect("write");
        fs::write(base.join("libs/native.so"), b"").expect("write");

        let source = format!(
            concat!(
                "{}",
                "[[dependencies]]\nid = \"guava\"\nfile = \"libs/guava-31.1.jar\"\n",
                "[[dependencies]]\nid = \"native\"\nfile = \"libs/native.so\"\nkind = \"so\"\n",
                "[[dependencies]]\nid = \"gone\"\nfile = \"libs/gone-1.0.jar\"\n",
            ),
            MINIMAL
        );
        let path = base.join(DEFAULT_DESCRIPTOR);
        fs::write(&path, source).expect("write descriptor");

        let project = Descriptor::load(&path)
            .expect("loads")
            .project()
            .expect("resolves");
        assert_eq!(project.dependencies.identifiers(), "guava");
        assert_eq!(project.artifact_id.as_str(), "wordcount");
    }

    #[rstest]
    fn missing_descriptor_is_a_configuration_error() {
        let err = Descriptor::load(Utf8Path::new("/definitely/not/here/hdeploy.toml"))
            .expect_err("must fail");
        assert!(matches!(err, DeployError::Configuration { .. }));
    }
}
