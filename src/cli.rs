//! CLI argument definitions for the release tool.
//!
//! Kept apart from the entrypoint so the binary stays focused on
//! orchestration and the parser can be tested directly.

use camino::Utf8PathBuf;
use clap::Parser;

/// Build, package and publish a Swift binary-target release.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "components-release")]
#[command(about, disable_version_flag = true)]
#[command(long_about = concat!(
    "Build, package and publish a Swift binary-target release.\n\n",
    "Checks out the requested branch of the source repository, builds the ",
    "framework, zips it, rewrites the package manifest with the new version, ",
    "checksum and download URL, commits and pushes the package, and creates a ",
    "release with the archive attached.\n\n",
    "Credentials are read from ~/.netrc (machine api.github.com) or GITHUB_TOKEN.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Publish version 1.0.44 from main:\n",
    "    $ components-release --version 1.0.44 --branch main\n\n",
    "  Rehearse without pushing or publishing:\n",
    "    $ components-release --version 1.0.44 --branch main --local-only\n",
))]
pub struct Cli {
    /// Version label for the release (tagged as v<VERSION>).
    #[arg(long, value_name = "VERSION")]
    pub version: String,

    /// Branch of the source repository to build.
    #[arg(long, value_name = "BRANCH")]
    pub branch: String,

    /// Commit the package update locally; skip push and release.
    #[arg(long)]
    pub local_only: bool,

    /// Workspace root holding the source and package checkouts.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: Utf8PathBuf,

    /// Configuration file [default: <ROOT>/release.toml when present].
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
