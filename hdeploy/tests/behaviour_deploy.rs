//! Behaviour-driven tests for job jar deployment.
//!
//! Remote filesystems are replaced by in-memory doubles, except for the
//! `file://` scenario which writes to a temporary directory.

mod support;

use camino::Utf8PathBuf;
use hdeploy::error::DeployError;
use hdeploy::pipeline::pack;
use hdeploy::test_utils::{FailingFileSystem, RecordingFileSystem};
use hdeploy::upload::{Destination, LocalFileSystem, UploadReport, upload};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::fs;
use support::{MAIN_CLASS, ProjectFixture};

const NAME_NODE: &str = "hdfs://namenode:8020/user/jobs";

// ---------------------------------------------------------------------------
// Deploy world
// ---------------------------------------------------------------------------

struct DeployWorld {
    fixture: ProjectFixture,
    archive: RefCell<Option<Utf8PathBuf>>,
    original: RefCell<Vec<u8>>,
    remote: RecordingFileSystem,
    result: RefCell<Option<Result<UploadReport, DeployError>>>,
}

#[fixture]
fn deploy_world() -> DeployWorld {
    DeployWorld {
        fixture: ProjectFixture::new(),
        archive: RefCell::new(None),
        original: RefCell::new(Vec::new()),
        remote: RecordingFileSystem::new(),
        result: RefCell::new(None),
    }
}

impl DeployWorld {
    fn archive(&self) -> Utf8PathBuf {
        self.archive
            .borrow()
            .clone()
            .unwrap_or_else(|| self.fixture.project().archive_path())
    }

    fn result(&self) -> std::cell::Ref<'_, Option<Result<UploadReport, DeployError>>> {
        self.result.borrow()
    }
}

#[given("a packed archive")]
fn given_packed_archive(deploy_world: &DeployWorld) {
    let home = deploy_world.fixture.hadoop_home();
    let output = pack(
        &deploy_world.fixture.project(),
        Some(home.as_path()),
        Some(MAIN_CLASS),
    )
    .expect("pack succeeds");
    let bytes = fs::read(&output.archive).expect("archive readable");
    deploy_world.original.replace(bytes);
    deploy_world.archive.replace(Some(output.archive));
}

#[given("no packed archive")]
fn given_no_archive(deploy_world: &DeployWorld) {
    assert!(!deploy_world.archive().exists());
}

#[when("the archive is deployed to the name node")]
fn when_deployed_to_name_node(deploy_world: &DeployWorld) {
    let destination = Destination::parse(NAME_NODE).expect("valid URI");
    let result = upload(&deploy_world.archive(), &destination, &deploy_world.remote);
    deploy_world.result.replace(Some(result));
}

#[when("the archive is deployed to a failing remote")]
fn when_deployed_to_failing_remote(deploy_world: &DeployWorld) {
    let destination = Destination::parse(NAME_NODE).expect("valid URI");
    let remote = FailingFileSystem::new("connection reset by peer");
    let result = upload(&deploy_world.archive(), &destination, &remote);
    deploy_world.result.replace(Some(result));
}

#[when("the archive is deployed to a local directory")]
fn when_deployed_locally(deploy_world: &DeployWorld) {
    let target = deploy_world.fixture.base().join("mounted/jobs");
    let destination = Destination::parse(&format!("file://{target}")).expect("valid URI");
    let result = upload(&deploy_world.archive(), &destination, &LocalFileSystem);
    deploy_world.result.replace(Some(result));
}

#[then("the remote receives the archive bytes")]
fn then_remote_receives_bytes(deploy_world: &DeployWorld) {
    let writes = deploy_world.remote.writes();
    assert_eq!(writes.len(), 1);
    let write = writes.first().expect("one write");
    assert_eq!(
        write.destination,
        "hdfs://namenode:8020/user/jobs/wordcount-1.0-hdeploy.jar"
    );
    assert_eq!(write.contents, *deploy_world.original.borrow());
}

#[then("the upload report names the remote file")]
fn then_report_names_file(deploy_world: &DeployWorld) {
    let result = deploy_world.result();
    let report = match result.as_ref().expect("deploy was not run") {
        Ok(report) => report,
        Err(err) => panic!("deploy failed: {err}"),
    };
    assert!(report.destination.ends_with("/wordcount-1.0-hdeploy.jar"));
    let expected = u64::try_from(deploy_world.original.borrow().len()).expect("fits in u64");
    assert_eq!(report.bytes, expected);
}

#[then("deployment fails with a not found error")]
fn then_not_found(deploy_world: &DeployWorld) {
    let result = deploy_world.result();
    let result = result.as_ref().expect("deploy was not run");
    assert!(
        matches!(result, Err(DeployError::NotFound { .. })),
        "expected NotFound error, got {result:?}"
    );
}

#[then("the remote was never contacted")]
fn then_remote_untouched(deploy_world: &DeployWorld) {
    assert_eq!(deploy_world.remote.call_count(), 0);
}

#[then("deployment fails with a transfer error")]
fn then_transfer_error(deploy_world: &DeployWorld) {
    let result = deploy_world.result();
    let result = result.as_ref().expect("deploy was not run");
    assert!(
        matches!(result, Err(DeployError::Transfer { reason, .. }) if reason.contains("reset")),
        "expected Transfer error, got {result:?}"
    );
}

#[then("the local archive is unchanged")]
fn then_local_unchanged(deploy_world: &DeployWorld) {
    let bytes = fs::read(deploy_world.archive()).expect("archive still present");
    assert_eq!(bytes, *deploy_world.original.borrow());
}

#[then("the local directory holds a copy of the archive")]
fn then_local_copy(deploy_world: &DeployWorld) {
    let copy = deploy_world
        .fixture
        .base()
        .join("mounted/jobs/wordcount-1.0-hdeploy.jar");
    let bytes = fs::read(&copy).expect("copy present");
    assert_eq!(bytes, *deploy_world.original.borrow());
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/deploy.feature",
    name = "A packed archive is streamed to the remote filesystem"
)]
fn scenario_deploy_streams_archive(deploy_world: DeployWorld) {
    let _ = deploy_world;
}

#[scenario(
    path = "tests/features/deploy.feature",
    name = "Deploying before packing fails without contacting the remote"
)]
fn scenario_deploy_without_archive(deploy_world: DeployWorld) {
    let _ = deploy_world;
}

#[scenario(
    path = "tests/features/deploy.feature",
    name = "A remote failure leaves the local archive intact"
)]
fn scenario_remote_failure(deploy_world: DeployWorld) {
    let _ = deploy_world;
}

#[scenario(
    path = "tests/features/deploy.feature",
    name = "A file destination receives a copy of the archive"
)]
fn scenario_file_destination(deploy_world: DeployWorld) {
    let _ = deploy_world;
}
