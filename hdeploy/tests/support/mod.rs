//! Shared fixtures for the hdeploy behavioural tests.
//!
//! Builds a throwaway project on disk: a Hadoop home whose `lib/` provides
//! some libraries, a compiled classes directory, and a local repository of
//! dependency jars.

use camino::{Utf8Path, Utf8PathBuf};
use hdeploy::artifact_id::ArtifactId;
use hdeploy::project::{Artifact, DependencySet, Project};
use std::fs;
use tempfile::TempDir;

/// Main class compiled into every fixture project.
pub const MAIN_CLASS: &str = "com.example.WordCount";

/// A project laid out in a temporary directory.
pub struct ProjectFixture {
    _dir: TempDir,
    base: Utf8PathBuf,
}

impl ProjectFixture {
    /// Creates the fixture with the default runtime and dependencies.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir creation succeeds");
        let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("temp dir is UTF-8");
        let fixture = Self { _dir: dir, base };

        fixture.write("hadoop/lib/hadoop-core-1.0.0.jar", b"runtime");
        fixture.write("hadoop/lib/commons-logging-1.1.jar", b"runtime");
        fixture.write("build/classes/com/example/WordCount.class", b"\xca\xfe\xba\xbe");
        fixture.write("build/classes/wordcount.properties", b"mode=local\n");
        for jar in [
            "guava-31.1.jar",
            "commons-logging-1.1.jar",
            "hadoop-hdfs-2.0.jar",
            "jsp-api-2.1.jar",
        ] {
            fixture.write(&format!("repo/{jar}"), jar.as_bytes());
        }
        fixture
    }

    /// Returns the fixture's root directory.
    pub fn base(&self) -> &Utf8Path {
        &self.base
    }

    /// Returns the runtime home directory.
    pub fn hadoop_home(&self) -> Utf8PathBuf {
        self.base.join("hadoop")
    }

    /// Returns the project model with every repository jar as a dependency.
    pub fn project(&self) -> Project {
        let dependencies: DependencySet = [
            ("guava", "guava-31.1.jar"),
            ("commons-logging", "commons-logging-1.1.jar"),
            ("hadoop-hdfs", "hadoop-hdfs-2.0.jar"),
            ("jsp-api", "jsp-api-2.1.jar"),
        ]
        .into_iter()
        .map(|(id, file)| Artifact::archive(id, self.base.join("repo").join(file)))
        .collect();

        Project {
            artifact_id: ArtifactId::from("wordcount"),
            version: Some("1.0".to_owned()),
            classes_directory: self.base.join("build/classes"),
            output_directory: self.base.join("build/hadoop-deploy"),
            dependencies,
        }
    }

    /// Writes `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &[u8]) {
        let path = self.base.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, contents).expect("write fixture file");
    }
}
