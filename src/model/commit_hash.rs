//! Commit hash newtype for build provenance.
//!
//! Accepts lowercase hexadecimal object names from 7 characters (abbreviated)
//! up to 64 characters (SHA-256 object format repositories).

use super::error::{Result, ValueError};
use std::fmt;

/// Minimum length of an abbreviated object name.
const MIN_LEN: usize = 7;

/// Maximum length of a full object name in a SHA-256 repository.
const MAX_LEN: usize = 64;

/// A validated git commit identifier.
///
/// # Examples
///
/// ```
/// use components_release::model::commit_hash::CommitHash;
///
/// let hash: CommitHash = "abc1234".try_into().unwrap();
/// assert_eq!(hash.as_str(), "abc1234");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitHash(String);

impl CommitHash {
    /// Return the hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for CommitHash {
    type Error = ValueError;

    fn try_from(value: &str) -> Result<Self> {
        validate_commit_hash(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for CommitHash {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self> {
        validate_commit_hash(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for CommitHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_commit_hash(value: &str) -> Result<()> {
    let reject = |reason: String| ValueError::InvalidCommitHash {
        value: value.to_owned(),
        reason,
    };

    if value.len() < MIN_LEN {
        return Err(reject(format!(
            "hash must be at least {MIN_LEN} characters, got {}",
            value.len()
        )));
    }
    if value.len() > MAX_LEN {
        return Err(reject(format!(
            "hash must be at most {MAX_LEN} characters, got {}",
            value.len()
        )));
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(reject(format!("non-hex character '{bad}'")));
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(reject("hash must be lowercase".to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::abbreviated("abc1234".to_owned())]
    #[case::sha1("a".repeat(40))]
    #[case::sha256("b".repeat(64))]
    fn accepts_valid_lengths(#[case] value: String) {
        assert!(CommitHash::try_from(value).is_ok());
    }

    #[rstest]
    #[case::empty(String::new())]
    #[case::too_short("abc123".to_owned())]
    #[case::too_long("a".repeat(65))]
    #[case::non_hex("abc123g".to_owned())]
    #[case::uppercase("ABC1234".to_owned())]
    fn rejects_malformed_hashes(#[case] value: String) {
        let err = CommitHash::try_from(value).expect_err("hash should be rejected");
        assert!(matches!(err, ValueError::InvalidCommitHash { .. }));
    }

    #[test]
    fn display_shows_inner_value() {
        let hash = CommitHash::try_from(String::from("deadbeef")).expect("known good");
        assert_eq!(hash.to_string(), "deadbeef");
    }
}
