//! Error types for artifact packaging operations.
//!
//! Covers I/O failures, zip encoding problems, and directory entries that
//! cannot be represented in a portable archive.

use std::path::PathBuf;
use thiserror::Error;

/// Errors arising from artifact packaging operations.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// An I/O operation failed (walking the artifact, writing the archive).
    #[error("I/O error during packaging: {0}")]
    Io(#[from] std::io::Error),

    /// The zip encoder rejected an entry or failed to finish the archive.
    #[error("zip error during packaging: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An entry name is not valid UTF-8 and cannot be stored portably.
    #[error("artifact entry has a non-UTF-8 name: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// An entry is neither a file, a directory, nor a symbolic link.
    #[error("artifact entry is not a regular file, directory, or symlink: {}", .0.display())]
    UnsupportedEntry(PathBuf),
}
