//! Release configuration backed by an optional TOML file.
//!
//! Every key has a default that reproduces the stock Swift components
//! release, so a workspace without `release.toml` runs unchanged. Values
//! present in the file replace the defaults one key at a time; unknown keys
//! are rejected so typos fail loudly instead of being ignored.

use crate::error::{ReleaseError, Result};
use crate::model::RepositoryRef;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

/// Configuration file looked up in the workspace root when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "release.toml";

/// Top-level release configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Upstream repository the framework is built from.
    pub source_repository: RepositoryRef,
    /// Downstream Swift package repository that receives the release.
    pub package_repository: RepositoryRef,
    /// Source checkout, relative to the workspace root.
    pub source_dir: Utf8PathBuf,
    /// Package checkout, relative to the workspace root.
    pub package_dir: Utf8PathBuf,
    /// Directory receiving release archives, relative to the workspace root.
    pub dist_dir: Utf8PathBuf,
    /// How the framework is built.
    pub build: BuildSettings,
    /// Where generated sources and the manifest live in the package.
    pub manifest: ManifestSettings,
    /// Release API settings.
    pub publish: PublishSettings,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            source_repository: RepositoryRef::from_static("Ruchit-Xaana", "matrix-rust-sdk"),
            package_repository: RepositoryRef::from_static(
                "Ruchit-Xaana",
                "matrix-rust-components-swift",
            ),
            source_dir: Utf8PathBuf::from("source"),
            package_dir: Utf8PathBuf::from("package"),
            dist_dir: Utf8PathBuf::from("dist"),
            build: BuildSettings::default(),
            manifest: ManifestSettings::default(),
            publish: PublishSettings::default(),
        }
    }
}

/// Settings for the framework build.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSettings {
    /// Program and arguments, run inside the source checkout.
    pub command: Vec<String>,
    /// Variables removed from the build command's environment.
    pub unset_env: Vec<String>,
    /// Build output directory, relative to the source checkout.
    pub output_dir: Utf8PathBuf,
    /// Name of the artifact inside the output directory.
    pub artifact_name: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            command: [
                "cargo",
                "xtask",
                "swift",
                "build-framework",
                "--release",
                "--target",
                "aarch64-apple-ios",
                "--target",
                "aarch64-apple-ios-sim",
                "--target",
                "x86_64-apple-ios",
            ]
            .map(str::to_owned)
            .to_vec(),
            unset_env: vec!["SDKROOT".to_owned()],
            output_dir: Utf8PathBuf::from("bindings/apple/generated"),
            artifact_name: "MatrixSDKFFI.xcframework".to_owned(),
        }
    }
}

/// Settings for the package checkout contents.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestSettings {
    /// Manifest file, relative to the package checkout.
    pub file: Utf8PathBuf,
    /// Generated Swift sources, relative to the build output directory.
    pub generated_sources_dir: Utf8PathBuf,
    /// Destination of the generated sources, relative to the package checkout.
    pub package_sources_dir: Utf8PathBuf,
    /// Web host serving release downloads, written into the manifest url.
    pub download_host: String,
}

impl Default for ManifestSettings {
    fn default() -> Self {
        Self {
            file: Utf8PathBuf::from("Package.swift"),
            generated_sources_dir: Utf8PathBuf::from("swift"),
            package_sources_dir: Utf8PathBuf::from("Sources/MatrixRustSDK"),
            download_host: "https://github.com".to_owned(),
        }
    }
}

/// Settings for the release API and credential lookup.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PublishSettings {
    /// Host serving the release API; also the netrc machine name.
    pub api_host: String,
    /// Global timeout for each API call, in seconds.
    pub http_timeout_secs: u64,
    /// Environment variable consulted for a token.
    pub token_env_var: String,
    /// Netrc file to read instead of `~/.netrc`.
    pub netrc_path: Option<Utf8PathBuf>,
}

impl PublishSettings {
    /// The HTTP timeout as a [`Duration`].
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            api_host: "api.github.com".to_owned(),
            http_timeout_secs: 600,
            token_env_var: "GITHUB_TOKEN".to_owned(),
            netrc_path: None,
        }
    }
}

/// Absolute locations of the directories a run works in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkspaceLayout {
    /// Source checkout.
    pub source_dir: Utf8PathBuf,
    /// Package checkout.
    pub package_dir: Utf8PathBuf,
    /// Archive output directory.
    pub dist_dir: Utf8PathBuf,
}

impl ReleaseConfig {
    /// Load configuration for the workspace at `root`.
    ///
    /// An explicit `path` must exist. Without one, `<root>/release.toml` is
    /// read when present and defaults are used otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Configuration`] if the file cannot be read,
    /// does not parse, or fails validation.
    pub fn load(root: &Utf8Path, path: Option<&Utf8Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let implicit = root.join(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    Self::from_file(&implicit)?
                } else {
                    log::debug!("no {implicit}; using built-in defaults");
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Configuration`] carrying the parser message.
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| ReleaseError::configuration(e.to_string()))
    }

    fn from_file(path: &Utf8Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .map_err(|e| ReleaseError::configuration(format!("cannot read {path}: {e}")))?;
        log::debug!("loaded configuration from {path}");
        toml::from_str(&source)
            .map_err(|e| ReleaseError::configuration(format!("invalid {path}: {e}")))
    }

    /// Reject settings that cannot produce a working run.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Configuration`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.build.command.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(ReleaseError::configuration("build.command must name a program"));
        }
        let artifact = &self.build.artifact_name;
        if artifact.is_empty() || artifact.contains(['/', '\\']) {
            return Err(ReleaseError::configuration(format!(
                "build.artifact_name must be a plain file name, got {artifact:?}"
            )));
        }
        let host = &self.manifest.download_host;
        if !host.starts_with("https://") && !host.starts_with("http://") {
            return Err(ReleaseError::configuration(format!(
                "manifest.download_host must be an http(s) URL, got {host:?}"
            )));
        }
        if self.publish.http_timeout_secs == 0 {
            return Err(ReleaseError::configuration(
                "publish.http_timeout_secs must be positive",
            ));
        }
        if self.publish.api_host.trim().is_empty() {
            return Err(ReleaseError::configuration("publish.api_host must not be empty"));
        }
        Ok(())
    }

    /// Resolve the configured directories against `root`.
    #[must_use]
    pub fn layout(&self, root: &Utf8Path) -> WorkspaceLayout {
        WorkspaceLayout {
            source_dir: root.join(&self.source_dir),
            package_dir: root.join(&self.package_dir),
            dist_dir: root.join(&self.dist_dir),
        }
    }
}
