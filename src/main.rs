//! Release CLI entrypoint.
//!
//! Builds the SDK's Swift framework, packages it, updates the Swift package
//! and publishes a GitHub release. Progress goes to stderr; the exit code is
//! zero only when every stage completed (or was skipped for a local-only
//! run).

use clap::Parser;
use components_release::app;
use components_release::cli::Cli;
use components_release::dirs::SystemBaseDirs;
use components_release::output::{failure_message, success_message, write_stderr_line};
use components_release::pipeline::{RunReport, StageFailure};
use components_release::runner::SystemCommandRunner;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = app::run(&cli, &SystemCommandRunner, &SystemBaseDirs, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn exit_code_for_run_result(
    result: Result<RunReport, StageFailure>,
    stderr: &mut dyn Write,
) -> i32 {
    match result {
        Ok(report) => {
            write_stderr_line(stderr, "");
            write_stderr_line(stderr, success_message(&report));
            0
        }
        Err(failure) => {
            write_stderr_line(stderr, failure_message(&failure));
            1
        }
    }
}
