//! Values handed from one pipeline stage to the next.

use super::commit_hash::CommitHash;
use super::repository::RepositoryRef;
use super::sha256_digest::Sha256Digest;
use super::version::{BranchName, ReleaseVersion};
use camino::Utf8PathBuf;

/// The result of one build run.
///
/// Produced once by [`crate::builder::SourceBuilder::build`] and only read
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProduct {
    /// Upstream repository the build was made from.
    pub source_repository: RepositoryRef,
    /// Version label requested for this release.
    pub version: ReleaseVersion,
    /// Revision checked out when the build command ran.
    pub commit: CommitHash,
    /// Branch that was checked out.
    pub branch: BranchName,
    /// Directory the build command writes its output to.
    pub output_dir: Utf8PathBuf,
    /// Name of the artifact inside `output_dir` (e.g. `MatrixSDKFFI.xcframework`).
    pub artifact_name: String,
}

impl BuildProduct {
    /// Path of the built artifact.
    #[must_use]
    pub fn artifact_path(&self) -> Utf8PathBuf {
        self.output_dir.join(&self.artifact_name)
    }
}

/// An archived build artifact ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedArtifact {
    /// Location of the archive file.
    pub archive_path: Utf8PathBuf,
    /// File name used for the release asset.
    pub asset_name: String,
    /// SHA-256 of the archive bytes.
    pub checksum: Sha256Digest,
}
