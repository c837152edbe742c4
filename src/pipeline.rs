//! Release pipeline orchestration.
//!
//! A run moves strictly forward through the stages in [`Stage`]: checkout,
//! build, package, manifest update, commit, push and release. Each stage
//! consumes the previous stage's output. The first failure stops the run
//! and is reported as a [`StageFailure`] carrying the stages that had
//! already completed, so the operator can see what was left behind.
//!
//! In local-only mode the commit is still created but the push and the
//! release are skipped, and nothing touches the network.

use crate::artifact::ArtifactPackager;
use crate::builder::SourceBuilder;
use crate::config::{ReleaseConfig, WorkspaceLayout};
use crate::error::ReleaseError;
use crate::git::Git;
use crate::manifest::{ManifestFields, ManifestUpdater, PackageManifest};
use crate::model::{
    BranchName, BuildProduct, CommitHash, PackagedArtifact, ReleaseVersion, Sha256Digest,
};
use crate::output::write_stderr_line;
use crate::publisher::{PublishedRelease, ReleaseDraft, ReleasePublisher};
use crate::runner::CommandRunner;
use std::fmt;
use std::fs;
use std::io::Write;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Configuration, credential and working tree checks.
    Init,
    /// Source branch checkout.
    Checkout,
    /// Framework build.
    Build,
    /// Archive and checksum.
    Package,
    /// Source mirror and manifest rewrite.
    ManifestUpdate,
    /// Package commit.
    Commit,
    /// Package push.
    Push,
    /// Remote release and asset upload.
    Release,
    /// Terminal state of a successful run.
    Done,
}

impl Stage {
    /// Lower-case stage name used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Checkout => "checkout",
            Self::Build => "build",
            Self::Package => "package",
            Self::ManifestUpdate => "manifest update",
            Self::Commit => "commit",
            Self::Push => "push",
            Self::Release => "release",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage ran to completion.
    Completed,
    /// The stage was skipped because the run is local-only.
    SkippedLocalOnly,
}

/// One stage and its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageRecord {
    /// The stage.
    pub stage: Stage,
    /// Its outcome.
    pub outcome: StageOutcome,
}

/// What a run was asked to release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    /// Version label for the release.
    pub version: ReleaseVersion,
    /// Source branch to build.
    pub branch: BranchName,
    /// Commit locally but skip push and release.
    pub local_only: bool,
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Every stage in order with its outcome, ending with [`Stage::Done`].
    pub stages: Vec<StageRecord>,
    /// The build that was released.
    pub product: BuildProduct,
    /// The uploaded (or, when local-only, uploadable) archive.
    pub artifact: PackagedArtifact,
    /// Values written into the manifest.
    pub manifest: ManifestFields,
    /// Revision of the package commit.
    pub package_commit: CommitHash,
    /// The remote release, absent for local-only runs.
    pub release: Option<PublishedRelease>,
}

impl RunReport {
    /// The outcome recorded for `stage`, if it ran.
    #[must_use]
    pub fn outcome(&self, stage: Stage) -> Option<StageOutcome> {
        self.stages
            .iter()
            .find(|record| record.stage == stage)
            .map(|record| record.outcome)
    }
}

/// A run that stopped at `stage`.
#[derive(Debug)]
pub struct StageFailure {
    /// The stage that failed.
    pub stage: Stage,
    /// Why it failed.
    pub error: ReleaseError,
    /// Stages that finished before the failure.
    pub completed: Vec<StageRecord>,
}

impl StageFailure {
    /// A failure before any stage ran.
    #[must_use]
    pub fn at_init(error: ReleaseError) -> Self {
        Self {
            stage: Stage::Init,
            error,
            completed: Vec::new(),
        }
    }

    /// Guidance for failures that leave the package or the remote in a
    /// state the operator must repair by hand.
    #[must_use]
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match (self.stage, &self.error) {
            (Stage::Push, _) => Some(
                "the manifest commit exists only in the local package checkout; \
                 push it by hand or reset it before releasing again",
            ),
            (Stage::Release, ReleaseError::ReleaseAlreadyExists { .. }) => Some(
                "the manifest commit was pushed but a release with this tag already exists; \
                 delete that release or publish under a new version",
            ),
            (Stage::Release, ReleaseError::AssetUploadFailure { .. }) => Some(
                "the manifest commit was pushed and the release may exist without its asset; \
                 upload the archive from the dist directory by hand",
            ),
            (Stage::Release, _) => Some(
                "the manifest commit was pushed but no release was created; \
                 create the release and upload the archive by hand",
            ),
            _ => None,
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "release failed during {}: {}", self.stage, self.error)
    }
}

impl std::error::Error for StageFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Format the package commit message for `product`.
///
/// # Examples
///
/// ```
/// use components_release::model::{
///     BranchName, BuildProduct, CommitHash, ReleaseVersion, RepositoryRef,
/// };
/// use components_release::pipeline::commit_message;
///
/// let product = BuildProduct {
///     source_repository: RepositoryRef::new("owner", "matrix-rust-sdk").unwrap(),
///     version: ReleaseVersion::try_from("1.0.44").unwrap(),
///     commit: CommitHash::try_from("abc1234").unwrap(),
///     branch: BranchName::try_from("main").unwrap(),
///     output_dir: "generated".into(),
///     artifact_name: "MatrixSDKFFI.xcframework".to_owned(),
/// };
/// assert_eq!(
///     commit_message(&product),
///     "Bump to version 1.0.44 (matrix-rust-sdk/main abc1234)"
/// );
/// ```
#[must_use]
pub fn commit_message(product: &BuildProduct) -> String {
    format!(
        "Bump to version {} ({}/{} {})",
        product.version,
        product.source_repository.name(),
        product.branch,
        product.commit
    )
}

/// Records stage outcomes as a run progresses.
struct StageTracker<'w> {
    records: Vec<StageRecord>,
    progress: &'w mut dyn Write,
}

impl<'w> StageTracker<'w> {
    fn new(progress: &'w mut dyn Write) -> Self {
        Self {
            records: Vec::new(),
            progress,
        }
    }

    /// Run `work` as `stage`, recording success or converting the error.
    fn run<T>(
        &mut self,
        stage: Stage,
        announce: impl fmt::Display,
        work: impl FnOnce() -> crate::error::Result<T>,
    ) -> Result<T, StageFailure> {
        write_stderr_line(self.progress, announce);
        match work() {
            Ok(value) => {
                self.record(stage, StageOutcome::Completed);
                Ok(value)
            }
            Err(error) => {
                log::warn!("stage {stage} failed: {error}");
                Err(StageFailure {
                    stage,
                    error,
                    completed: self.records.clone(),
                })
            }
        }
    }

    fn skip(&mut self, stage: Stage) {
        write_stderr_line(self.progress, format!("Skipping {stage} (local-only)."));
        self.record(stage, StageOutcome::SkippedLocalOnly);
    }

    fn record(&mut self, stage: Stage, outcome: StageOutcome) {
        log::debug!("stage {stage}: {outcome:?}");
        self.records.push(StageRecord { stage, outcome });
    }
}

/// Sequences one release from checkout to published asset.
pub struct ReleasePipeline<'a> {
    runner: &'a dyn CommandRunner,
    publisher: &'a dyn ReleasePublisher,
    config: &'a ReleaseConfig,
    layout: WorkspaceLayout,
}

impl<'a> ReleasePipeline<'a> {
    /// Create a pipeline over the directories in `layout`.
    ///
    /// Local-only runs should be given a publisher that performs no network
    /// I/O, such as [`crate::publisher::OfflinePublisher`].
    #[must_use]
    pub fn new(
        runner: &'a dyn CommandRunner,
        publisher: &'a dyn ReleasePublisher,
        config: &'a ReleaseConfig,
        layout: WorkspaceLayout,
    ) -> Self {
        Self {
            runner,
            publisher,
            config,
            layout,
        }
    }

    /// Run every stage for `request`, writing progress lines to `progress`.
    ///
    /// # Errors
    ///
    /// Returns a [`StageFailure`] naming the first stage that failed. Nothing
    /// is retried or rolled back.
    pub fn run(
        &self,
        request: &ReleaseRequest,
        progress: &mut dyn Write,
    ) -> Result<RunReport, StageFailure> {
        let mut tracker = StageTracker::new(progress);
        let config = self.config;
        let layout = &self.layout;

        let builder = tracker.run(Stage::Init, "Checking workspace...", || {
            let builder = SourceBuilder::new(
                self.runner,
                config.source_repository.clone(),
                &layout.source_dir,
                &config.build,
            )?;
            if !layout.package_dir.is_dir() {
                return Err(ReleaseError::configuration(format!(
                    "package checkout for {} not found at {}",
                    config.package_repository, layout.package_dir
                )));
            }
            Ok(builder)
        })?;

        let checked_out = tracker.run(
            Stage::Checkout,
            format!("Checking out {}...", request.branch),
            || builder.checkout(&request.branch),
        )?;

        let product = tracker.run(
            Stage::Build,
            format!("Building {} at {}...", request.version, checked_out.commit),
            || builder.build(&checked_out, &request.version),
        )?;

        let artifact = tracker.run(
            Stage::Package,
            format!("Packaging {}...", product.artifact_name),
            || ArtifactPackager::new(&layout.dist_dir).package(&product),
        )?;

        let updater = ManifestUpdater::new(&config.manifest);
        let mut manifest = PackageManifest::new(
            &layout.package_dir,
            config.package_repository.clone(),
            &config.manifest.file,
        );
        let fields = tracker.run(
            Stage::ManifestUpdate,
            format!("Updating {}...", manifest.manifest_file()),
            || updater.update(&mut manifest, &product, &artifact),
        )?;

        let package_git = Git::new(self.runner, &layout.package_dir);
        let package_commit = tracker.run(Stage::Commit, "Committing package update...", || {
            let touched = updater.touched_paths(&manifest);
            let paths: Vec<&str> = touched.iter().map(|p| p.as_str()).collect();
            package_git.add(&paths)?;
            package_git.commit(&commit_message(&product))?;
            package_git.commit_hash()
        })?;

        let release = if request.local_only {
            tracker.skip(Stage::Push);
            tracker.skip(Stage::Release);
            None
        } else {
            tracker.run(Stage::Push, "Pushing package update...", || {
                package_git.push()
            })?;
            let release = tracker.run(
                Stage::Release,
                format!("Publishing release {}...", request.version.tag()),
                || self.publish(&request.version, &artifact, &package_commit),
            )?;
            Some(release)
        };

        tracker.record(Stage::Done, StageOutcome::Completed);
        Ok(RunReport {
            stages: tracker.records,
            product,
            artifact,
            manifest: fields,
            package_commit,
            release,
        })
    }

    /// Create the release and attach the archive.
    ///
    /// The archive is re-read and re-hashed first; bytes that no longer match
    /// the checksum written into the manifest are never published.
    fn publish(
        &self,
        version: &ReleaseVersion,
        artifact: &PackagedArtifact,
        package_commit: &CommitHash,
    ) -> crate::error::Result<PublishedRelease> {
        let tag = version.tag();
        let bytes = fs::read(&artifact.archive_path)?;
        let digest = Sha256Digest::of_bytes(&bytes);
        if digest != artifact.checksum {
            return Err(ReleaseError::AssetUploadFailure {
                tag,
                asset: artifact.asset_name.clone(),
                reason: format!(
                    "archive changed after packaging (expected sha256 {}, found {digest})",
                    artifact.checksum
                ),
            });
        }

        let draft = ReleaseDraft {
            tag: tag.clone(),
            name: tag,
            target_commitish: package_commit.to_string(),
        };
        let release = self
            .publisher
            .create_release(&self.config.package_repository, &draft)?;
        log::info!("created release {} at {}", release.tag, release.html_url);
        self.publisher
            .upload_asset(&release, &artifact.asset_name, &bytes)?;
        Ok(release)
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
