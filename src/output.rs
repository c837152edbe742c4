//! Operator-facing progress and summary text.
//!
//! Library code reports through the `log` facade; the lines produced here
//! are what a person running a release reads on stderr.

use crate::pipeline::{RunReport, StageFailure, StageOutcome};
use std::fmt::Display;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Format the closing summary of a successful run.
#[must_use]
pub fn success_message(report: &RunReport) -> String {
    let mut lines = vec![format!(
        "Released {} {} ({} {})",
        report.product.source_repository.name(),
        report.product.version,
        report.product.branch,
        report.product.commit
    )];
    lines.push(format!("  archive:  {}", report.artifact.archive_path));
    lines.push(format!("  checksum: {}", report.artifact.checksum));
    lines.push(format!("  commit:   {}", report.package_commit));
    match &report.release {
        Some(release) => lines.push(format!("  release:  {}", release.html_url)),
        None => lines.push("  local-only: push and release skipped".to_owned()),
    }
    let skipped = report
        .stages
        .iter()
        .filter(|record| record.outcome == StageOutcome::SkippedLocalOnly)
        .count();
    if skipped > 0 {
        lines.push(format!("  {skipped} stage(s) skipped"));
    }
    lines.join("\n")
}

/// Format a failed run, including the recovery hint when there is one.
#[must_use]
pub fn failure_message(failure: &StageFailure) -> String {
    match failure.recovery_hint() {
        Some(hint) => format!("{failure}\nhint: {hint}"),
        None => failure.to_string(),
    }
}
