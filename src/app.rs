//! Wiring from parsed arguments to a pipeline run.
//!
//! Everything that can be checked without touching a working tree happens
//! here: argument validation, configuration loading and credential lookup.
//! Failures at this point are reported as failures of the init stage.

use crate::cli::Cli;
use crate::config::ReleaseConfig;
use crate::credential::{default_providers, resolve_credential};
use crate::dirs::BaseDirs;
use crate::error::{ReleaseError, Result};
use crate::model::{BranchName, ReleaseVersion};
use crate::pipeline::{ReleasePipeline, ReleaseRequest, RunReport, StageFailure};
use crate::publisher::{GitHubPublisher, OfflinePublisher};
use crate::runner::CommandRunner;
use std::io::Write;

/// Build a [`ReleaseRequest`] from the command line.
///
/// # Errors
///
/// Returns [`ReleaseError::Configuration`] if the version or branch is
/// malformed.
pub fn request_from_cli(cli: &Cli) -> Result<ReleaseRequest> {
    let version = ReleaseVersion::try_from(cli.version.as_str())
        .map_err(|e| ReleaseError::configuration(e.to_string()))?;
    let branch = BranchName::try_from(cli.branch.as_str())
        .map_err(|e| ReleaseError::configuration(e.to_string()))?;
    Ok(ReleaseRequest {
        version,
        branch,
        local_only: cli.local_only,
    })
}

/// Run a release as described by `cli`.
///
/// Local-only runs never look up a credential and are given a publisher
/// that cannot reach the network.
///
/// # Errors
///
/// Returns a [`StageFailure`] for the first failing stage; setup problems
/// are reported against the init stage.
pub fn run(
    cli: &Cli,
    runner: &dyn CommandRunner,
    dirs: &dyn BaseDirs,
    stderr: &mut dyn Write,
) -> std::result::Result<RunReport, StageFailure> {
    let request = request_from_cli(cli).map_err(StageFailure::at_init)?;
    let config = ReleaseConfig::load(&cli.root, cli.config.as_deref())
        .map_err(StageFailure::at_init)?;
    let layout = config.layout(&cli.root);

    if request.local_only {
        log::info!("local-only run; push and release will be skipped");
        let publisher = OfflinePublisher;
        return ReleasePipeline::new(runner, &publisher, &config, layout).run(&request, stderr);
    }

    let credential = resolve_credential(&default_providers(&config.publish, dirs))
        .map_err(StageFailure::at_init)?;
    let publisher =
        GitHubPublisher::new(credential, &config.publish).map_err(StageFailure::at_init)?;
    ReleasePipeline::new(runner, &publisher, &config, layout).run(&request, stderr)
}
