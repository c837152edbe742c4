//! Release version and branch newtypes.
//!
//! Both values arrive from the command line and end up inside git arguments,
//! Swift string literals, and release URLs, so they are validated once at the
//! edge and passed around as typed values afterwards.

use super::error::{Result, ValueError};
use std::fmt;

/// A validated version label such as `1.0.44` or `1.0.44-alpha`.
///
/// # Examples
///
/// ```
/// use components_release::model::version::ReleaseVersion;
///
/// let version = ReleaseVersion::try_from("1.0.44").unwrap();
/// assert_eq!(version.tag(), "v1.0.44");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    /// Return the version label as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the release tag for this version.
    ///
    /// Labels already carrying a `v` prefix are used verbatim so that
    /// `--version v1.0.44` and `--version 1.0.44` name the same release.
    #[must_use]
    pub fn tag(&self) -> String {
        if self.0.starts_with('v') {
            self.0.clone()
        } else {
            format!("v{}", self.0)
        }
    }
}

impl TryFrom<&str> for ReleaseVersion {
    type Error = ValueError;

    fn try_from(value: &str) -> Result<Self> {
        validate_version(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_version(value: &str) -> Result<()> {
    let reject = |reason: &str| ValueError::InvalidVersion {
        value: value.to_owned(),
        reason: reason.to_owned(),
    };

    if value.is_empty() {
        return Err(reject("version must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(reject("version must not contain whitespace"));
    }
    if value.chars().any(|c| matches!(c, '/' | '"' | '\\' | '?' | '#')) {
        return Err(reject("version must not contain '/', '\"', '\\', '?' or '#'"));
    }
    if value.starts_with('-') {
        return Err(reject("version must not start with '-'"));
    }
    Ok(())
}

/// A validated git branch name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchName(String);

impl BranchName {
    /// Return the branch name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for BranchName {
    type Error = ValueError;

    fn try_from(value: &str) -> Result<Self> {
        validate_branch(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_branch(value: &str) -> Result<()> {
    let reject = |reason: &str| ValueError::InvalidBranch {
        value: value.to_owned(),
        reason: reason.to_owned(),
    };

    if value.is_empty() {
        return Err(reject("branch must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(reject("branch must not contain whitespace"));
    }
    // A leading dash would be read by git as an option.
    if value.starts_with('-') {
        return Err(reject("branch must not start with '-'"));
    }
    Ok(())
}
