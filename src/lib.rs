//! Release tooling for the Swift package that wraps the Matrix Rust SDK.
//!
//! A release checks out a branch of the SDK source repository, builds the
//! Swift framework, packages it as a zip archive with a SHA-256 checksum,
//! rewrites the package manifest to point at the new asset, commits and
//! pushes the package repository, and finally publishes a GitHub release
//! carrying the archive. The `components-release` binary drives the whole
//! sequence; the library exposes each step for testing and reuse.
//!
//! # Modules
//!
//! - [`app`] - Wiring from parsed arguments to a pipeline run
//! - [`artifact`] - Deterministic zip packaging and checksums
//! - [`builder`] - Source checkout and framework build
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Release configuration file loading and defaults
//! - [`credential`] - Hosting-service token lookup (netrc, environment)
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Semantic error types for every failure kind
//! - [`git`] - Git operations run through a [`runner::CommandRunner`]
//! - [`manifest`] - Package manifest rewriting and source mirroring
//! - [`model`] - Validated domain values (versions, digests, repositories)
//! - [`output`] - Operator-facing progress and summary text
//! - [`pipeline`] - Stage sequencing, outcomes and recovery hints
//! - [`publisher`] - GitHub release creation and asset upload
//! - [`runner`] - External command execution abstraction
//! - [`sources`] - Atomic directory mirroring

pub mod app;
pub mod artifact;
pub mod builder;
pub mod cli;
pub mod config;
pub mod credential;
pub mod dirs;
pub mod error;
pub mod git;
pub mod manifest;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod publisher;
pub mod runner;
pub mod sources;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
