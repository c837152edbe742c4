//! Shared test doubles for the release pipeline.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! integration tests under `tests/`.

use crate::error::{ReleaseError, Result};
use crate::model::RepositoryRef;
use crate::publisher::{PublishedRelease, ReleaseDraft, ReleasePublisher};
use crate::runner::{CommandRunner, Invocation};
use camino::Utf8PathBuf;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a successful command `Output` printing `stdout`.
#[must_use]
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        stdout: stdout.as_bytes().to_vec(),
        ..success_output()
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// An expected command invocation and the result to answer it with.
#[derive(Debug)]
pub struct ExpectedCall {
    program: String,
    args: Vec<String>,
    directory: Option<Utf8PathBuf>,
    result: io::Result<Output>,
}

impl ExpectedCall {
    /// Expect `program` with exactly `args`, answering with `result`.
    pub fn new<I, S>(program: &str, args: I, result: io::Result<Output>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_owned(),
            args: args.into_iter().map(Into::into).collect(),
            directory: None,
            result,
        }
    }

    /// Also require the invocation to run in `directory`.
    #[must_use]
    pub fn in_dir(mut self, directory: impl Into<Utf8PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }
}

/// A scripted [`CommandRunner`].
///
/// Answers expected invocations in order and records everything it was
/// asked to run. An unexpected invocation fails the test.
#[derive(Debug, Default)]
pub struct StubRunner {
    expected: RefCell<VecDeque<ExpectedCall>>,
    seen: RefCell<Vec<Invocation>>,
}

impl StubRunner {
    /// Creates a runner that expects `expected` in order.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Every invocation received so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.seen.borrow().clone()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        let remaining = self.expected.borrow();
        assert!(
            remaining.is_empty(),
            "expected no further command invocations, {} remain: {:?}",
            remaining.len(),
            remaining
                .iter()
                .map(|call| format!("{} {}", call.program, call.args.join(" ")))
                .collect::<Vec<_>>()
        );
    }
}

impl CommandRunner for StubRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<Output> {
        self.seen.borrow_mut().push(invocation.clone());
        let Some(call) = self.expected.borrow_mut().pop_front() else {
            panic!("unexpected command invocation: {}", invocation.command_line());
        };

        assert_eq!(call.program, invocation.program());
        assert_eq!(call.args.as_slice(), invocation.arguments());
        if let Some(directory) = &call.directory {
            assert_eq!(directory, invocation.directory());
        }

        call.result
    }
}

/// How a [`RecordingPublisher`] should answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublisherBehaviour {
    /// Every call succeeds.
    #[default]
    Succeed,
    /// Release creation fails because the tag exists.
    TagExists,
    /// Release creation fails because the credential is refused.
    RejectCredential,
    /// Release creation succeeds; the asset upload fails.
    FailUpload,
}

/// A recorded asset upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    /// Tag of the release the asset was attached to.
    pub tag: String,
    /// Asset file name.
    pub asset_name: String,
    /// Uploaded bytes.
    pub bytes: Vec<u8>,
}

/// A [`ReleasePublisher`] that records calls instead of talking to a host.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    behaviour: PublisherBehaviour,
    releases: RefCell<Vec<(RepositoryRef, ReleaseDraft)>>,
    uploads: RefCell<Vec<RecordedUpload>>,
}

impl RecordingPublisher {
    /// Creates a publisher answering with `behaviour`.
    #[must_use]
    pub fn new(behaviour: PublisherBehaviour) -> Self {
        Self {
            behaviour,
            ..Self::default()
        }
    }

    /// Releases requested so far.
    #[must_use]
    pub fn releases(&self) -> Vec<(RepositoryRef, ReleaseDraft)> {
        self.releases.borrow().clone()
    }

    /// Uploads attempted so far.
    #[must_use]
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.borrow().clone()
    }
}

impl ReleasePublisher for RecordingPublisher {
    fn create_release(
        &self,
        repository: &RepositoryRef,
        draft: &ReleaseDraft,
    ) -> Result<PublishedRelease> {
        self.releases
            .borrow_mut()
            .push((repository.clone(), draft.clone()));
        match self.behaviour {
            PublisherBehaviour::TagExists => Err(ReleaseError::ReleaseAlreadyExists {
                tag: draft.tag.clone(),
            }),
            PublisherBehaviour::RejectCredential => Err(ReleaseError::AuthenticationFailure {
                reason: "401 Bad credentials".to_owned(),
            }),
            PublisherBehaviour::Succeed | PublisherBehaviour::FailUpload => Ok(PublishedRelease {
                id: 1,
                tag: draft.tag.clone(),
                html_url: format!("https://github.com/{repository}/releases/tag/{}", draft.tag),
                upload_url: format!(
                    "https://uploads.github.com/repos/{repository}/releases/1/assets{{?name,label}}"
                ),
            }),
        }
    }

    fn upload_asset(&self, release: &PublishedRelease, asset_name: &str, bytes: &[u8]) -> Result<()> {
        self.uploads.borrow_mut().push(RecordedUpload {
            tag: release.tag.clone(),
            asset_name: asset_name.to_owned(),
            bytes: bytes.to_vec(),
        });
        if self.behaviour == PublisherBehaviour::FailUpload {
            return Err(ReleaseError::AssetUploadFailure {
                tag: release.tag.clone(),
                asset: asset_name.to_owned(),
                reason: "connection reset by peer".to_owned(),
            });
        }
        Ok(())
    }
}
