//! Validation errors for release value types.
//!
//! Each variant names the rejected input and the constraint it violated.

use thiserror::Error;

/// Errors arising from invalid release identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// A version label is empty or contains characters unusable in a tag.
    #[error("invalid version \"{value}\": {reason}")]
    InvalidVersion {
        /// The rejected version label.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A branch name is empty or would be parsed as a git option.
    #[error("invalid branch \"{value}\": {reason}")]
    InvalidBranch {
        /// The rejected branch name.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A repository reference is not of the form `owner/name`.
    #[error("invalid repository \"{value}\": expected owner/name")]
    InvalidRepository {
        /// The rejected repository string.
        value: String,
    },

    /// A commit hash is empty, too long, or contains non-hex characters.
    #[error("invalid commit hash \"{value}\": {reason}")]
    InvalidCommitHash {
        /// The rejected hash string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A SHA-256 digest is not a valid 64-character hex string.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidSha256Digest {
        /// Description of the validation failure.
        reason: String,
    },
}

/// Result type alias using [`ValueError`].
pub type Result<T> = std::result::Result<T, ValueError>;
