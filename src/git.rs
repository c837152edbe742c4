//! Git operations on the source and package checkouts.
//!
//! A [`Git`] value is bound to one working tree; every command it issues runs
//! in that directory through the injected [`CommandRunner`]. Only `push`
//! talks to the network, so only `push` carries a timeout.

use crate::error::{ReleaseError, Result};
use crate::model::{BranchName, CommitHash};
use crate::runner::{CommandRunner, Invocation, combined_output};
use camino::Utf8Path;
use std::process::Output;
use std::time::Duration;

/// Default timeout for `git push` (5 minutes).
const PUSH_TIMEOUT: Duration = Duration::from_secs(300);

/// Git client bound to a single working tree.
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    directory: &'a Utf8Path,
}

impl<'a> Git<'a> {
    /// Bind a client to `directory`.
    #[must_use]
    pub fn new(runner: &'a dyn CommandRunner, directory: &'a Utf8Path) -> Self {
        Self { runner, directory }
    }

    /// Switch the working tree to `branch`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::CheckoutFailure`] if git cannot be started or
    /// refuses the checkout (unknown branch, dirty tree).
    pub fn checkout(&self, branch: &BranchName) -> Result<()> {
        let failure = |message: String| ReleaseError::CheckoutFailure {
            branch: branch.to_string(),
            message,
        };
        let output = self
            .git(&["checkout", branch.as_str()], None)
            .map_err(|e| failure(e.to_string()))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(failure(combined_output(&output)))
        }
    }

    /// Read the commit currently checked out.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Git`] if `git rev-parse` fails or prints
    /// something that is not an object name.
    pub fn commit_hash(&self) -> Result<CommitHash> {
        let output = self.checked(&["rev-parse", "HEAD"], "rev-parse")?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        CommitHash::try_from(stdout.trim()).map_err(|e| ReleaseError::Git {
            operation: "rev-parse",
            message: e.to_string(),
        })
    }

    /// Stage `paths`, including deletions beneath them.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Git`] if `git add` fails.
    pub fn add(&self, paths: &[&str]) -> Result<()> {
        let mut args = vec!["add", "--all", "--"];
        args.extend_from_slice(paths);
        self.checked(&args, "add").map(drop)
    }

    /// Commit the staged changes.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::NothingToCommit`] if git refuses to commit.
    pub fn commit(&self, message: &str) -> Result<()> {
        let output = self
            .git(&["commit", "--message", message], None)
            .map_err(|e| ReleaseError::NothingToCommit {
                message: e.to_string(),
            })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ReleaseError::NothingToCommit {
                message: combined_output(&output),
            })
        }
    }

    /// Push the current branch to its upstream.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::PushFailure`] if the push is rejected, cannot
    /// reach the remote, or exceeds the push timeout.
    pub fn push(&self) -> Result<()> {
        let output = self
            .git(&["push"], Some(PUSH_TIMEOUT))
            .map_err(|e| ReleaseError::PushFailure {
                message: e.to_string(),
            })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ReleaseError::PushFailure {
                message: combined_output(&output),
            })
        }
    }

    fn checked(&self, args: &[&str], operation: &'static str) -> Result<Output> {
        let output = self.git(args, None).map_err(|e| ReleaseError::Git {
            operation,
            message: e.to_string(),
        })?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(ReleaseError::Git {
                operation,
                message: combined_output(&output),
            })
        }
    }

    fn git(&self, args: &[&str], timeout: Option<Duration>) -> std::io::Result<Output> {
        let mut invocation = Invocation::new("git", self.directory).args(args.iter().copied());
        if let Some(timeout) = timeout {
            invocation = invocation.with_timeout(timeout);
        }
        self.runner.run(&invocation)
    }
}
