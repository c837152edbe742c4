//! Error types for the release pipeline.
//!
//! Each variant names the failure in operator terms and carries the context
//! needed to diagnose it by hand (captured command output, the offending
//! path, the remote response). Nothing here is retried automatically.

use crate::artifact::packaging_error::PackagingError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Number of trailing output lines shown when a build command fails.
const BUILD_OUTPUT_TAIL_LINES: usize = 40;

/// Errors that can occur while preparing or running a release.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// A required option, credential, or directory is missing or invalid.
    #[error("configuration error: {reason}")]
    Configuration {
        /// Description of the configuration problem.
        reason: String,
    },

    /// The source working tree could not be switched to the requested branch.
    #[error("checkout of branch {branch} failed: {message}")]
    CheckoutFailure {
        /// Branch that was requested.
        branch: String,
        /// Captured git output.
        message: String,
    },

    /// The external build command exited unsuccessfully.
    #[error("build command `{command}` failed:\n{}", tail(.output, BUILD_OUTPUT_TAIL_LINES))]
    BuildFailure {
        /// The command line that was run.
        command: String,
        /// Combined stdout and stderr of the build.
        output: String,
    },

    /// The build output directory or the named artifact inside it is missing.
    #[error("build artifact not found at {path}")]
    ArtifactNotFound {
        /// Path where the artifact was expected.
        path: Utf8PathBuf,
    },

    /// The package manifest does not declare the expected fields.
    #[error("manifest {path} does not match the expected format: {reason}")]
    ManifestFormatMismatch {
        /// Path to the manifest file.
        path: Utf8PathBuf,
        /// Which field was missing or duplicated.
        reason: String,
    },

    /// `git commit` refused to create a commit.
    #[error("nothing to commit in the package repository: {message}")]
    NothingToCommit {
        /// Captured git output.
        message: String,
    },

    /// `git push` was rejected or could not reach the remote.
    #[error("push to the package remote failed: {message}")]
    PushFailure {
        /// Captured git output.
        message: String,
    },

    /// The credential is missing, malformed, or was refused by the remote.
    #[error("authentication failed: {reason}")]
    AuthenticationFailure {
        /// Description of the authentication problem.
        reason: String,
    },

    /// A release with the requested tag already exists on the remote.
    #[error("release {tag} already exists")]
    ReleaseAlreadyExists {
        /// The duplicate tag.
        tag: String,
    },

    /// The release was created but the archive could not be attached to it.
    #[error("upload of {asset} to release {tag} failed: {reason}")]
    AssetUploadFailure {
        /// Tag of the release that was created.
        tag: String,
        /// Name of the asset that was being uploaded.
        asset: String,
        /// Description of the upload failure.
        reason: String,
    },

    /// A git operation outside checkout, commit, and push failed.
    #[error("git {operation} failed: {message}")]
    Git {
        /// The git operation that failed (rev-parse, add, ...).
        operation: &'static str,
        /// Captured git output.
        message: String,
    },

    /// Archive creation failed.
    #[error(transparent)]
    Packaging(#[from] PackagingError),

    /// The release API answered with an unexpected response.
    #[error("{operation} failed: {reason}")]
    Http {
        /// The API call that failed.
        operation: &'static str,
        /// Status and body of the response, or the transport error.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReleaseError {
    /// Shorthand for a [`ReleaseError::Configuration`] error.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}

/// Result type alias using [`ReleaseError`].
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Returns the last `lines` lines of `text`.
fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let skip = all.len().saturating_sub(lines);
    all.into_iter().skip(skip).collect::<Vec<_>>().join("\n")
}
