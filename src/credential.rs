//! Release API credential discovery.
//!
//! Credentials come from an ordered list of providers; the first provider
//! that yields a token wins. The stock order reads the netrc file first and
//! then the token environment variable.

use crate::config::PublishSettings;
use crate::dirs::BaseDirs;
use crate::error::{ReleaseError, Result};
use camino::Utf8PathBuf;
use std::fmt;
use std::fs;
use std::io;

/// Netrc file name inside the home directory.
const NETRC_FILE: &str = ".netrc";

/// An opaque bearer token.
///
/// The token is never displayed; `Debug` prints a placeholder.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// A place a credential may be found.
pub trait CredentialProvider {
    /// Human-readable description used in diagnostics.
    fn describe(&self) -> String;

    /// Look up a token.
    ///
    /// Returns `Ok(None)` when this provider simply has no token.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Configuration`] when the source exists but
    /// cannot be read.
    fn credential(&self) -> Result<Option<Credential>>;
}

/// Reads the `password` of a machine entry from a netrc file.
#[derive(Debug, Clone)]
pub struct FileBackedProvider {
    path: Utf8PathBuf,
    machine: String,
}

impl FileBackedProvider {
    /// Read the entry for `machine` from the netrc file at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, machine: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            machine: machine.into(),
        }
    }
}

impl CredentialProvider for FileBackedProvider {
    fn describe(&self) -> String {
        format!("{} (machine {})", self.path, self.machine)
    }

    fn credential(&self) -> Result<Option<Credential>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ReleaseError::configuration(format!(
                    "cannot read {}: {e}",
                    self.path
                )));
            }
        };
        Ok(netrc_password(&contents, &self.machine).map(Credential::new))
    }
}

/// Reads a token from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvironmentVariableProvider {
    variable: String,
}

impl EnvironmentVariableProvider {
    /// Read the token from `variable`.
    #[must_use]
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl CredentialProvider for EnvironmentVariableProvider {
    fn describe(&self) -> String {
        format!("${}", self.variable)
    }

    fn credential(&self) -> Result<Option<Credential>> {
        Ok(std::env::var(&self.variable)
            .ok()
            .filter(|value| !value.is_empty())
            .map(Credential::new))
    }
}

/// Build the stock provider list: netrc first, then the environment.
///
/// The netrc path is the configured one, or `~/.netrc` when a home
/// directory is known. Without either, only the environment is consulted.
#[must_use]
pub fn default_providers(
    settings: &PublishSettings,
    dirs: &dyn BaseDirs,
) -> Vec<Box<dyn CredentialProvider>> {
    let netrc = settings.netrc_path.clone().or_else(|| {
        dirs.home_dir()
            .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
            .map(|home| home.join(NETRC_FILE))
    });

    let mut providers: Vec<Box<dyn CredentialProvider>> = Vec::new();
    if let Some(path) = netrc {
        providers.push(Box::new(FileBackedProvider::new(path, &settings.api_host)));
    }
    providers.push(Box::new(EnvironmentVariableProvider::new(
        &settings.token_env_var,
    )));
    providers
}

/// Ask each provider in turn and return the first credential found.
///
/// # Errors
///
/// Returns [`ReleaseError::Configuration`] if a provider fails or none of
/// them has a credential.
pub fn resolve_credential(providers: &[Box<dyn CredentialProvider>]) -> Result<Credential> {
    for provider in providers {
        if let Some(credential) = provider.credential()? {
            log::debug!("using credential from {}", provider.describe());
            return Ok(credential);
        }
    }
    let searched = providers
        .iter()
        .map(|p| p.describe())
        .collect::<Vec<_>>()
        .join(", ");
    Err(ReleaseError::configuration(format!(
        "no release credential found (searched {searched})"
    )))
}

/// Find the password for `machine` in netrc-formatted `contents`.
///
/// A `default` entry is used when no machine entry matches. `macdef`
/// bodies are skipped.
#[must_use]
pub fn netrc_password(contents: &str, machine: &str) -> Option<String> {
    let mut tokens = netrc_tokens(contents).into_iter();
    let mut entry = NetrcEntry::Other;
    let mut fallback = None;

    while let Some(token) = tokens.next() {
        match token {
            "machine" => {
                entry = if tokens.next() == Some(machine) {
                    NetrcEntry::Wanted
                } else {
                    NetrcEntry::Other
                };
            }
            "default" => entry = NetrcEntry::Default,
            "password" => {
                let Some(password) = tokens.next() else {
                    break;
                };
                match entry {
                    NetrcEntry::Wanted => return Some(password.to_owned()),
                    NetrcEntry::Default if fallback.is_none() => {
                        fallback = Some(password.to_owned());
                    }
                    NetrcEntry::Default | NetrcEntry::Other => {}
                }
            }
            "login" | "account" => {
                tokens.next();
            }
            _ => {}
        }
    }
    fallback
}

#[derive(Clone, Copy)]
enum NetrcEntry {
    Wanted,
    Default,
    Other,
}

/// Split netrc contents into tokens, dropping `macdef` bodies and comments.
fn netrc_tokens(contents: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut in_macro = false;
    for line in contents.lines() {
        if in_macro {
            in_macro = !line.trim().is_empty();
            continue;
        }
        if line.trim_start().starts_with('#') {
            continue;
        }
        for word in line.split_whitespace() {
            if word == "macdef" {
                in_macro = true;
                break;
            }
            tokens.push(word);
        }
    }
    tokens
}
