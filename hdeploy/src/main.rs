//! hdeploy CLI entrypoint.
//!
//! `hdeploy pack` builds a self-contained job jar from the project's compiled
//! classes and the dependencies the Hadoop runtime does not already provide.
//! `hdeploy deploy` uploads that jar to a distributed filesystem.

use camino::Utf8PathBuf;
use clap::Parser;
use hdeploy::cli::{Cli, Command, CommonArgs, DeployArgs, PackArgs};
use hdeploy::config::{DEFAULT_DESCRIPTOR, DEFAULT_WEBHDFS_PORT, Descriptor, HADOOP_HOME_ENV};
use hdeploy::error::{DeployError, Result};
use hdeploy::output::{DryRunInfo, pack_report_lines, upload_message, write_stderr_line};
use hdeploy::pipeline::{pack, plan, require_hadoop_home};
use hdeploy::upload::{Destination, RemoteOptions, remote_for, upload};
use log::LevelFilter;
use std::io::{self, Write};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.command.common().log_level());
    let mut stderr = io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Install the logger. `RUST_LOG` refines the level chosen on the command
/// line.
fn init_logging(level: LevelFilter) {
    let result = env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .try_init();
    if result.is_err() {
        // A logger is already installed.
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Command::Pack(args) => run_pack(args, stderr),
        Command::Deploy(args) => run_deploy(args, stderr),
    }
}

fn run_pack(args: &PackArgs, stderr: &mut dyn Write) -> Result<()> {
    let descriptor = load_descriptor(&args.common)?;
    let mut project = descriptor.project()?;
    if let Some(output_dir) = &args.common.output_dir {
        project.output_directory.clone_from(output_dir);
    }

    let env_home = std::env::var(HADOOP_HOME_ENV).ok();
    let hadoop_home = descriptor.hadoop_home(args.hadoop_home.as_deref(), env_home.as_deref());
    let main_class = descriptor.main_class(args.main_class.as_deref());

    if args.dry_run {
        let hadoop_home = require_hadoop_home(hadoop_home.as_deref())?;
        let outcome = plan(&project, hadoop_home)?;
        let archive = project.archive_path();
        let info = DryRunInfo {
            hadoop_home,
            archive: &archive,
            main_class,
            outcome: &outcome,
        };
        write_stderr_line(stderr, info.display_text());
        return Ok(());
    }

    if !args.common.quiet {
        write_stderr_line(
            stderr,
            format!("Packing {} into {}...", project.artifact_id, project.output_directory),
        );
    }

    let output = pack(&project, hadoop_home.as_deref(), main_class)?;

    if args.json {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &output)
            .map_err(|e| DeployError::WriteFailed { source: e.into() })?;
        writeln!(stdout).map_err(|source| DeployError::WriteFailed { source })?;
    } else if !args.common.quiet {
        for line in pack_report_lines(&output) {
            write_stderr_line(stderr, line);
        }
    }
    Ok(())
}

fn run_deploy(args: &DeployArgs, stderr: &mut dyn Write) -> Result<()> {
    let descriptor = load_descriptor(&args.common)?;
    let archive = descriptor.archive_path(args.common.output_dir.as_deref());
    let destination = Destination::parse(descriptor.deploy_path(args.path.as_deref()))?;
    let options = remote_options(args, &descriptor);
    let remote = remote_for(&destination, &options)?;

    if !args.common.quiet {
        write_stderr_line(stderr, format!("Uploading {archive} to {destination}..."));
    }
    let report = upload(&archive, &destination, remote.as_ref())?;
    if !args.common.quiet {
        write_stderr_line(stderr, upload_message(&report));
    }
    Ok(())
}

fn load_descriptor(common: &CommonArgs) -> Result<Descriptor> {
    let path = common
        .config
        .clone()
        .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DESCRIPTOR));
    Descriptor::load(&path)
}

fn remote_options(args: &DeployArgs, descriptor: &Descriptor) -> RemoteOptions {
    RemoteOptions {
        user: args.user.clone().or_else(|| descriptor.deploy.user.clone()),
        webhdfs_port: args
            .webhdfs_port
            .or(descriptor.deploy.webhdfs_port)
            .unwrap_or(DEFAULT_WEBHDFS_PORT),
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    struct Project {
        _dir: TempDir,
        base: Utf8PathBuf,
    }

    impl Project {
        fn descriptor(&self) -> Utf8PathBuf {
            self.base.join(DEFAULT_DESCRIPTOR)
        }
    }

    #[fixture]
    fn project() -> Project {
        let dir = TempDir::new().expect("temp dir creation succeeds");
        let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("temp dir is UTF-8");
        fs::write(
            base.join(DEFAULT_DESCRIPTOR),
            "[project]\nartifact-id = \"wordcount\"\nversion = \"1.0\"\n\n[deploy]\nuser = \"etl\"\n",
        )
        .expect("write descriptor");
        Project { _dir: dir, base }
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("hdeploy").chain(args.iter().copied()))
    }

    fn deploy_args(cli: &Cli) -> &DeployArgs {
        match &cli.command {
            Command::Deploy(args) => args,
            Command::Pack(_) => panic!("expected Deploy command"),
        }
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = DeployError::configuration("the Hadoop home directory is not set");

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("the Hadoop home directory is not set"));
    }

    #[test]
    fn missing_descriptor_fails_with_configuration_error() {
        let cli = parse(&["pack", "--config", "/definitely/not/here/hdeploy.toml"]);
        let mut stderr = Vec::new();
        let err = run(&cli, &mut stderr).expect_err("descriptor is missing");
        assert!(err.is_configuration());
    }

    #[rstest]
    fn deploy_without_archive_reports_not_found(project: Project) {
        let remote = project.base.join("remote");
        let cli = parse(&[
            "deploy",
            "--config",
            project.descriptor().as_str(),
            "--path",
            &format!("file://{remote}"),
        ]);
        let mut stderr = Vec::new();

        let err = run(&cli, &mut stderr).expect_err("archive was never packed");

        assert!(matches!(err, DeployError::NotFound { .. }));
        assert!(!remote.exists());
    }

    #[rstest]
    fn deploy_copies_archive_to_file_destination(project: Project) {
        let output = project.base.join("build/hadoop-deploy");
        fs::create_dir_all(&output).expect("mkdir");
        fs::write(output.join("wordcount-1.0-hdeploy.jar"), b"PK").expect("write archive");
        let remote = project.base.join("remote/jobs");
        let cli = parse(&[
            "deploy",
            "--config",
            project.descriptor().as_str(),
            "--path",
            &format!("file://{remote}"),
        ]);
        let mut stderr = Vec::new();

        run(&cli, &mut stderr).expect("deploy succeeds");

        let uploaded = fs::read(remote.join("wordcount-1.0-hdeploy.jar")).expect("uploaded");
        assert_eq!(uploaded, b"PK");
        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("Uploaded 2 bytes"));
    }

    #[rstest]
    fn deploy_reads_archive_from_overridden_output_directory(project: Project) {
        let class = project.base.join("build/classes/com/example/WordCount.class");
        fs::create_dir_all(class.parent().expect("has parent")).expect("mkdir classes");
        fs::write(&class, b"\xCA\xFE\xBA\xBE").expect("write class");
        let hadoop_home = project.base.join("hadoop");
        fs::create_dir_all(hadoop_home.join("lib")).expect("mkdir lib");
        let output = project.base.join("dist");
        let remote = project.base.join("remote/jobs");
        let mut stderr = Vec::new();

        let pack_cli = parse(&[
            "pack",
            "--config",
            project.descriptor().as_str(),
            "--hadoop-home",
            hadoop_home.as_str(),
            "--output-dir",
            output.as_str(),
        ]);
        run(&pack_cli, &mut stderr).expect("pack succeeds");
        let deploy_cli = parse(&[
            "deploy",
            "--config",
            project.descriptor().as_str(),
            "--output-dir",
            output.as_str(),
            "--path",
            &format!("file://{remote}"),
        ]);
        run(&deploy_cli, &mut stderr).expect("deploy succeeds");

        let packed = fs::read(output.join("wordcount-1.0-hdeploy.jar")).expect("packed");
        let uploaded = fs::read(remote.join("wordcount-1.0-hdeploy.jar")).expect("uploaded");
        assert_eq!(uploaded, packed);
        assert!(!project.base.join("build/hadoop-deploy").exists());
    }

    #[rstest]
    #[case::descriptor_user(&["deploy"], Some("etl"), DEFAULT_WEBHDFS_PORT)]
    #[case::cli_overrides(
        &["deploy", "--user", "ops", "--webhdfs-port", "50070"],
        Some("ops"),
        50070
    )]
    fn remote_options_layer_cli_over_descriptor(
        project: Project,
        #[case] args: &[&str],
        #[case] user: Option<&str>,
        #[case] port: u16,
    ) {
        let descriptor = Descriptor::load(&project.descriptor()).expect("loads");
        let cli = parse(args);

        let options = remote_options(deploy_args(&cli), &descriptor);

        assert_eq!(options.user.as_deref(), user);
        assert_eq!(options.webhdfs_port, port);
    }
}
