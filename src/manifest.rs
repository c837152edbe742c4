//! Package manifest rewriting.
//!
//! The Swift package declares its binary target through three string
//! constants in `Package.swift`:
//!
//! ```swift
//! let checksum = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
//! let version = "v1.0.43"
//! let url = "https://github.com/owner/package/releases/download/\(version)/MatrixSDKFFI.xcframework.zip"
//! ```
//!
//! Only the quoted literal of each declaration is replaced. Every other byte
//! of the file, including line endings and trailing comments, is preserved.
//! A url that interpolates `\(version)` keeps the interpolation.

use crate::config::ManifestSettings;
use crate::error::{ReleaseError, Result};
use crate::model::{BuildProduct, PackagedArtifact, ReleaseVersion, RepositoryRef, Sha256Digest};
use crate::sources::mirror_directory;
use camino::{Utf8Path, Utf8PathBuf};
use std::borrow::Cow;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Swift interpolation of the version constant inside the url literal.
const VERSION_INTERPOLATION: &str = "\\(version)";

/// Declarations rewritten in the manifest. They may appear in any order.
const FIELDS: [&str; 3] = ["version", "checksum", "url"];

/// The values written into the manifest for one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFields {
    /// Release tag, written as the version literal.
    pub version: String,
    /// Archive checksum.
    pub checksum: Sha256Digest,
    /// Download URL of the release asset.
    pub url: String,
}

impl ManifestFields {
    fn value(&self, field: &str) -> &str {
        match field {
            "version" => &self.version,
            "checksum" => self.checksum.as_str(),
            _ => &self.url,
        }
    }
}

/// Why a manifest could not be rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestFieldError {
    /// No `let <field> = "..."` declaration was found.
    #[error("no `let {0} = \"...\"` declaration")]
    Missing(&'static str),
    /// The declaration appears more than once.
    #[error("`let {field}` is declared {count} times")]
    Duplicated {
        /// The duplicated field.
        field: &'static str,
        /// Number of declarations found.
        count: usize,
    },
}

/// Build the release download URL for `asset` under `tag` on `host`.
///
/// # Examples
///
/// ```
/// use components_release::manifest::download_url;
/// use components_release::model::RepositoryRef;
///
/// let repo = RepositoryRef::new("owner", "package").unwrap();
/// assert_eq!(
///     download_url("https://github.com", &repo, "v1.0.44", "Foo.xcframework.zip"),
///     "https://github.com/owner/package/releases/download/v1.0.44/Foo.xcframework.zip"
/// );
/// ```
#[must_use]
pub fn download_url(host: &str, repository: &RepositoryRef, tag: &str, asset: &str) -> String {
    format!(
        "{}/{}/{}/releases/download/{tag}/{asset}",
        host.trim_end_matches('/'),
        repository.owner(),
        repository.name()
    )
}

/// Replace the version, checksum and URL literals in `contents`.
///
/// # Errors
///
/// Returns [`ManifestFieldError`] if any field is missing or declared more
/// than once. Nothing is returned in that case, so the caller never writes a
/// partially rewritten manifest.
pub fn rewrite_manifest(
    contents: &str,
    fields: &ManifestFields,
) -> std::result::Result<String, ManifestFieldError> {
    let mut counts = [0_usize; FIELDS.len()];
    let mut rewritten = String::with_capacity(contents.len());

    for line in contents.split_inclusive('\n') {
        let replacement = FIELDS.iter().zip(counts.iter_mut()).find_map(|(field, count)| {
            let (start, end) = literal_span(line, field)?;
            *count += 1;
            let value = literal_value(field, line.get(start..end)?, fields);
            splice(line, start, end, &value)
        });
        rewritten.push_str(replacement.as_deref().unwrap_or(line));
    }

    for (&field, count) in FIELDS.iter().zip(counts) {
        match count {
            1 => {}
            0 => return Err(ManifestFieldError::Missing(field)),
            count => return Err(ManifestFieldError::Duplicated { field, count }),
        }
    }
    Ok(rewritten)
}

/// Byte range of the quoted literal in `let <field> = "<literal>"`.
fn literal_span(line: &str, field: &str) -> Option<(usize, usize)> {
    let after_let = line.trim_start().strip_prefix("let")?;
    let name = after_let.trim_start();
    if name.len() == after_let.len() {
        return None;
    }
    let inner = name
        .strip_prefix(field)?
        .trim_start()
        .strip_prefix('=')?
        .trim_start()
        .strip_prefix('"')?;
    let close = inner.find('"')?;
    let start = line.len() - inner.len();
    Some((start, start + close))
}

/// The replacement for `field`, given the literal it replaces.
///
/// A url that refers to the version through `\(version)` keeps doing so.
fn literal_value<'f>(field: &str, existing: &str, fields: &'f ManifestFields) -> Cow<'f, str> {
    let value = fields.value(field);
    if field != "url" || !existing.contains(VERSION_INTERPOLATION) {
        return Cow::Borrowed(value);
    }
    let segment = format!("/{}/", fields.version);
    Cow::Owned(value.replacen(&segment, &format!("/{VERSION_INTERPOLATION}/"), 1))
}

fn splice(line: &str, start: usize, end: usize, value: &str) -> Option<String> {
    Some(format!("{}{value}{}", line.get(..start)?, line.get(end..)?))
}

/// The package checkout and the manifest it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    package_root: Utf8PathBuf,
    repository: RepositoryRef,
    manifest_file: Utf8PathBuf,
    fields: Option<ManifestFields>,
}

impl PackageManifest {
    /// Describe the manifest `manifest_file` inside the package checkout at
    /// `package_root`, published to `repository`.
    #[must_use]
    pub fn new(
        package_root: impl Into<Utf8PathBuf>,
        repository: RepositoryRef,
        manifest_file: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            package_root: package_root.into(),
            repository,
            manifest_file: manifest_file.into(),
            fields: None,
        }
    }

    /// Root of the package checkout.
    #[must_use]
    pub fn package_root(&self) -> &Utf8Path {
        &self.package_root
    }

    /// Repository the package is pushed to.
    #[must_use]
    pub fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    /// Manifest path relative to the package root.
    #[must_use]
    pub fn manifest_file(&self) -> &Utf8Path {
        &self.manifest_file
    }

    /// Absolute manifest path.
    #[must_use]
    pub fn path(&self) -> Utf8PathBuf {
        self.package_root.join(&self.manifest_file)
    }

    /// The values written by the last successful update, if any.
    #[must_use]
    pub fn fields(&self) -> Option<&ManifestFields> {
        self.fields.as_ref()
    }

    /// Rewrite the manifest on disk with `fields`.
    ///
    /// The new contents are written to a temporary file beside the manifest
    /// and renamed over it.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ManifestFormatMismatch`] if the manifest does
    /// not declare each field exactly once; the file is left untouched.
    pub fn apply(&mut self, fields: ManifestFields) -> Result<()> {
        let path = self.path();
        let rewritten = self.render(&fields)?;
        write_atomically(&path, &rewritten)?;
        log::info!("updated {path} to version {}", fields.version);
        self.fields = Some(fields);
        Ok(())
    }

    /// Compute the rewritten manifest without writing it.
    fn render(&self, fields: &ManifestFields) -> Result<String> {
        let path = self.path();
        let contents = fs::read_to_string(&path).map_err(|e| {
            ReleaseError::ManifestFormatMismatch {
                path: path.clone(),
                reason: format!("cannot read manifest: {e}"),
            }
        })?;
        rewrite_manifest(&contents, fields).map_err(|e| ReleaseError::ManifestFormatMismatch {
            path,
            reason: e.to_string(),
        })
    }
}

fn write_atomically(path: &Utf8Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let mut staged = NamedTempFile::new_in(parent)?;
    staged.write_all(contents.as_bytes())?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| ReleaseError::Io(e.error))?;
    Ok(())
}

/// Brings the package checkout in line with a new build.
#[derive(Debug, Clone)]
pub struct ManifestUpdater<'a> {
    settings: &'a ManifestSettings,
}

impl<'a> ManifestUpdater<'a> {
    /// Create an updater using the configured source and manifest locations.
    #[must_use]
    pub fn new(settings: &'a ManifestSettings) -> Self {
        Self { settings }
    }

    /// Paths, relative to the package root, that an update touches.
    #[must_use]
    pub fn touched_paths(&self, manifest: &PackageManifest) -> Vec<Utf8PathBuf> {
        vec![
            manifest.manifest_file().to_owned(),
            self.settings.package_sources_dir.clone(),
        ]
    }

    /// The manifest values for `artifact` released as `version`.
    ///
    /// The version literal carries the release tag, which is also the
    /// download path segment.
    #[must_use]
    pub fn fields_for(
        &self,
        repository: &RepositoryRef,
        version: &ReleaseVersion,
        artifact: &PackagedArtifact,
    ) -> ManifestFields {
        let tag = version.tag();
        ManifestFields {
            url: download_url(
                &self.settings.download_host,
                repository,
                &tag,
                &artifact.asset_name,
            ),
            version: tag,
            checksum: artifact.checksum.clone(),
        }
    }

    /// Mirror the generated sources and rewrite the manifest for `artifact`.
    ///
    /// The manifest is checked before anything is written, so a malformed
    /// manifest leaves the package checkout exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ManifestFormatMismatch`] for a malformed
    /// manifest, [`ReleaseError::ArtifactNotFound`] if the generated sources
    /// are missing, or [`ReleaseError::Io`] if writing fails.
    pub fn update(
        &self,
        manifest: &mut PackageManifest,
        product: &BuildProduct,
        artifact: &PackagedArtifact,
    ) -> Result<ManifestFields> {
        let fields = self.fields_for(manifest.repository(), &product.version, artifact);
        manifest.render(&fields)?;

        let generated = product.output_dir.join(&self.settings.generated_sources_dir);
        let destination = manifest
            .package_root()
            .join(&self.settings.package_sources_dir);
        mirror_directory(&generated, &destination)?;

        manifest.apply(fields.clone())?;
        Ok(fields)
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
