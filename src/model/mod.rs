//! Release data model.
//!
//! - [`commit_hash`] - validated git object names (`CommitHash`).
//! - [`error`] - validation errors for the value types.
//! - [`product`] - `BuildProduct` and `PackagedArtifact`.
//! - [`repository`] - `owner/name` repository references.
//! - [`sha256_digest`] - archive checksums (`Sha256Digest`).
//! - [`version`] - `ReleaseVersion` and `BranchName`.

pub mod commit_hash;
pub mod error;
pub mod product;
pub mod repository;
pub mod sha256_digest;
pub mod version;

pub use commit_hash::CommitHash;
pub use product::{BuildProduct, PackagedArtifact};
pub use repository::RepositoryRef;
pub use sha256_digest::Sha256Digest;
pub use version::{BranchName, ReleaseVersion};
