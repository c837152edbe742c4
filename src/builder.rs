//! Source checkout and framework build.
//!
//! The builder owns the source working tree for the duration of a run: it
//! switches the tree to the requested branch, records the revision that is
//! actually checked out, then runs the configured build command against it.

use crate::config::BuildSettings;
use crate::error::{ReleaseError, Result};
use crate::git::Git;
use crate::model::{BranchName, BuildProduct, CommitHash, ReleaseVersion, RepositoryRef};
use crate::runner::{CommandRunner, Invocation, combined_output};
use camino::{Utf8Path, Utf8PathBuf};

/// A branch checked out in the source working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedOut {
    /// The branch that was checked out.
    pub branch: BranchName,
    /// Revision read immediately after the checkout.
    pub commit: CommitHash,
}

/// Drives checkout and build of the upstream source repository.
pub struct SourceBuilder<'a> {
    runner: &'a dyn CommandRunner,
    source_repository: RepositoryRef,
    working_tree: Utf8PathBuf,
    settings: &'a BuildSettings,
}

impl<'a> SourceBuilder<'a> {
    /// Create a builder for the checkout at `working_tree`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Configuration`] if `working_tree` is not an
    /// existing directory. The checkout is never created on demand.
    pub fn new(
        runner: &'a dyn CommandRunner,
        source_repository: RepositoryRef,
        working_tree: &Utf8Path,
        settings: &'a BuildSettings,
    ) -> Result<Self> {
        if !working_tree.is_dir() {
            return Err(ReleaseError::configuration(format!(
                "source checkout for {source_repository} not found at {working_tree}"
            )));
        }
        Ok(Self {
            runner,
            source_repository,
            working_tree: working_tree.to_owned(),
            settings,
        })
    }

    /// Check out `branch` and read the resulting revision.
    ///
    /// The revision is read after the checkout so it always names the tree
    /// the build will see.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::CheckoutFailure`] if the checkout fails, or
    /// [`ReleaseError::Git`] if the revision cannot be read.
    pub fn checkout(&self, branch: &BranchName) -> Result<CheckedOut> {
        let git = Git::new(self.runner, &self.working_tree);
        git.checkout(branch)?;
        let commit = git.commit_hash()?;
        log::info!("checked out {branch} at {commit} in {}", self.working_tree);
        Ok(CheckedOut {
            branch: branch.clone(),
            commit,
        })
    }

    /// Run the build command against the checked-out tree.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::BuildFailure`] with the captured output if the
    /// command cannot be started or exits unsuccessfully.
    pub fn build(&self, checked_out: &CheckedOut, version: &ReleaseVersion) -> Result<BuildProduct> {
        let invocation = self.build_invocation()?;
        let command = invocation.command_line();
        log::info!(
            "building {} {version} from {}",
            self.source_repository,
            checked_out.commit
        );

        let output = self
            .runner
            .run(&invocation)
            .map_err(|e| ReleaseError::BuildFailure {
                command: command.clone(),
                output: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ReleaseError::BuildFailure {
                command,
                output: combined_output(&output),
            });
        }

        Ok(BuildProduct {
            source_repository: self.source_repository.clone(),
            version: version.clone(),
            commit: checked_out.commit.clone(),
            branch: checked_out.branch.clone(),
            output_dir: self.working_tree.join(&self.settings.output_dir),
            artifact_name: self.settings.artifact_name.clone(),
        })
    }

    fn build_invocation(&self) -> Result<Invocation> {
        let (program, args) = self
            .settings
            .command
            .split_first()
            .ok_or_else(|| ReleaseError::configuration("build command is empty"))?;

        let invocation = self
            .settings
            .unset_env
            .iter()
            .fold(
                Invocation::new(program.as_str(), &self.working_tree).args(args.iter().cloned()),
                |invocation, name| invocation.without_env(name.as_str()),
            );
        Ok(invocation)
    }
}
