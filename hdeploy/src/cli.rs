//! CLI argument definitions for hdeploy.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

/// Package and deploy Hadoop MapReduce job jars.
#[derive(Parser, Debug)]
#[command(name = "hdeploy")]
#[command(version, about)]
#[command(long_about = concat!(
    "Package and deploy Hadoop MapReduce job jars.\n\n",
    "`hdeploy pack` copies the project's compiled classes and every dependency the ",
    "Hadoop runtime does not already provide into a single job jar. Dependencies ",
    "found in <hadoop home>/lib, and anything named hadoop* or jsp-*, are left out.\n\n",
    "`hdeploy deploy` uploads the packed jar to a directory on HDFS.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Pack the project described by ./hdeploy.toml:\n",
    "    $ hdeploy pack --hadoop-home /opt/hadoop\n\n",
    "  Show which dependencies would be packaged:\n",
    "    $ hdeploy pack --dry-run\n\n",
    "  Upload the jar to HDFS:\n",
    "    $ hdeploy deploy --path hdfs://namenode:8020/user/jobs",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build the job jar.
    Pack(PackArgs),

    /// Upload the job jar to a distributed filesystem.
    Deploy(DeployArgs),
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Project descriptor [default: ./hdeploy.toml].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Directory holding the job jar [default: <build dir>/hadoop-deploy].
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl CommonArgs {
    /// Log level selected by `-v`/`-q`.
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Arguments for the pack command.
#[derive(Args, Debug, Clone, Default)]
pub struct PackArgs {
    /// Shared options.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Hadoop installation directory [default: descriptor, then $HADOOP_HOME].
    #[arg(long, value_name = "DIR")]
    pub hadoop_home: Option<Utf8PathBuf>,

    /// Entry point recorded as Main-Class in the manifest.
    #[arg(short, long, value_name = "CLASS")]
    pub main_class: Option<String>,

    /// Show what would be packaged and exit without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the pack report as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the deploy command.
#[derive(Args, Debug, Clone, Default)]
pub struct DeployArgs {
    /// Shared options.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Destination directory URI [default: hdfs://localhost:8020/].
    #[arg(short, long, value_name = "URI")]
    pub path: Option<String>,

    /// Remote user name for WebHDFS requests.
    #[arg(short, long, value_name = "NAME")]
    pub user: Option<String>,

    /// WebHDFS HTTP port used for hdfs:// destinations [default: 9870].
    #[arg(long, value_name = "PORT")]
    pub webhdfs_port: Option<u16>,
}

impl Command {
    /// Return the options shared by every subcommand.
    #[must_use]
    pub const fn common(&self) -> &CommonArgs {
        match self {
            Self::Pack(args) => &args.common,
            Self::Deploy(args) => &args.common,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
