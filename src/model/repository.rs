//! Repository references (`owner/name`) for the source and package repos.

use super::error::ValueError;
use serde::Deserialize;
use std::fmt;

/// Identifies a hosted git repository by owner and name.
///
/// Deserialises from an `owner/name` string so configuration files can use
/// the same spelling as the hosting service.
///
/// # Examples
///
/// ```
/// use components_release::model::repository::RepositoryRef;
///
/// let repo = RepositoryRef::new("element-hq", "matrix-rust-sdk").unwrap();
/// assert_eq!(repo.to_string(), "element-hq/matrix-rust-sdk");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct RepositoryRef {
    owner: String,
    name: String,
}

impl RepositoryRef {
    /// Build a reference from its owner and name halves.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidRepository`] if either half is empty or
    /// contains whitespace or `/`.
    pub fn new(owner: &str, name: &str) -> Result<Self, ValueError> {
        let valid = |part: &str| {
            !part.is_empty() && !part.chars().any(|c| c == '/' || c.is_whitespace())
        };
        if valid(owner) && valid(name) {
            Ok(Self {
                owner: owner.to_owned(),
                name: name.to_owned(),
            })
        } else {
            Err(ValueError::InvalidRepository {
                value: format!("{owner}/{name}"),
            })
        }
    }

    /// Build a reference from halves known to be valid, such as built-in
    /// defaults.
    pub(crate) fn from_static(owner: &'static str, name: &'static str) -> Self {
        debug_assert!(Self::new(owner, name).is_ok(), "invalid built-in repository");
        Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        }
    }

    /// The owning user or organisation.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TryFrom<&str> for RepositoryRef {
    type Error = ValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.split_once('/') {
            Some((owner, name)) => Self::new(owner, name),
            None => Err(ValueError::InvalidRepository {
                value: value.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for RepositoryRef {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
