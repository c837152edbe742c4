//! Build artifact packaging.
//!
//! - [`packaging`] - deterministic zip archives and their SHA-256 checksum.
//! - [`packaging_error`] - error types for packaging operations.

pub mod packaging;
pub mod packaging_error;

pub use packaging::{ArtifactPackager, compute_sha256, create_archive};
pub use packaging_error::PackagingError;
