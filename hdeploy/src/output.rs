//! Output formatting for the hdeploy CLI.
//!
//! Progress and results go to stderr as plain lines; `pack --json` writes a
//! machine-readable report to stdout instead.

use crate::filter::FilterOutcome;
use crate::pipeline::PackOutput;
use crate::upload::UploadReport;
use camino::Utf8Path;
use std::fmt;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format a success message after packing.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use hdeploy::output::success_message;
///
/// let archive = Utf8Path::new("build/hadoop-deploy/wordcount-hdeploy.jar");
/// let msg = success_message(2, archive);
/// assert_eq!(
///     msg,
///     "Packed 2 libraries into build/hadoop-deploy/wordcount-hdeploy.jar"
/// );
/// ```
#[must_use]
pub fn success_message(libraries: usize, archive: &Utf8Path) -> String {
    let plural = if libraries == 1 { "library" } else { "libraries" };
    format!("Packed {libraries} {plural} into {archive}")
}

/// Lines describing a finished packaging run.
#[must_use]
pub fn pack_report_lines(output: &PackOutput) -> Vec<String> {
    let mut lines = vec![
        success_message(output.retained.len(), &output.archive),
        format!("  SHA-256: {}", output.sha256),
        format!(
            "  Entries: {} ({} directories, {} files)",
            output.summary.entry_count(),
            output.summary.directories,
            output.summary.files
        ),
    ];
    for excluded in &output.excluded {
        lines.push(format!(
            "  Ignored {}: {}",
            excluded.artifact.identifier, excluded.reason
        ));
    }
    lines.push(String::new());
    lines.push("Run the job with:".to_owned());
    lines.push(format!("  {}", output.run_command));
    lines
}

/// Information shown by `pack --dry-run`.
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Runtime installation directory.
    pub hadoop_home: &'a Utf8Path,
    /// Where the archive would be written.
    pub archive: &'a Utf8Path,
    /// Entry point that would be recorded.
    pub main_class: Option<&'a str>,
    /// The filter decision.
    pub outcome: &'a FilterOutcome,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - no files will be modified".to_owned(),
            String::new(),
            format!("Hadoop home: {}", self.hadoop_home),
            format!("Archive: {}", self.archive),
            format!("Main class: {}", self.main_class.unwrap_or("(none)")),
            String::new(),
            "Dependencies to package:".to_owned(),
        ];
        for artifact in &self.outcome.retained {
            lines.push(format!("  - {} ({})", artifact.identifier, artifact.file));
        }
        if !self.outcome.excluded.is_empty() {
            lines.push(String::new());
            lines.push("Dependencies provided by the runtime:".to_owned());
            for (artifact, reason) in &self.outcome.excluded {
                lines.push(format!("  - {} ({reason})", artifact.identifier));
            }
        }
        lines.join("\n")
    }
}

/// Format the message printed after a successful upload.
#[must_use]
pub fn upload_message(report: &UploadReport) -> String {
    format!("Uploaded {} bytes to {}", report.bytes, report.destination)
}
