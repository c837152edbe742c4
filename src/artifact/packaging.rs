//! Artifact packaging for binary-target distribution.
//!
//! Zips the built framework directory into a single archive rooted at the
//! framework's own name, then digests the archive bytes. Entry order,
//! timestamps and permissions are normalised so the same tree always
//! yields the same archive and therefore the same checksum.

use super::packaging_error::PackagingError;
use crate::error::{ReleaseError, Result};
use crate::model::{BuildProduct, PackagedArtifact, Sha256Digest};
use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// File extension appended to the artifact name to form the asset name.
const ARCHIVE_EXTENSION: &str = "zip";

/// Permissions recorded for directories and executable files.
const EXECUTABLE_MODE: u32 = 0o755;

/// Permissions recorded for other regular files.
const REGULAR_MODE: u32 = 0o644;

/// Packages build products into release archives under a dist directory.
#[derive(Debug, Clone)]
pub struct ArtifactPackager {
    dist_dir: Utf8PathBuf,
}

impl ArtifactPackager {
    /// Create a packager writing archives into `dist_dir`.
    #[must_use]
    pub fn new(dist_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dist_dir: dist_dir.into(),
        }
    }

    /// Archive the product's artifact and compute its checksum.
    ///
    /// The archive is written to `<dist_dir>/<artifact>.zip`, replacing any
    /// previous archive of the same name. The checksum is computed from the
    /// bytes on disk after the archive is complete.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ArtifactNotFound`] if the build output
    /// directory or the artifact inside it is missing, and
    /// [`ReleaseError::Packaging`] if the archive cannot be written.
    pub fn package(&self, product: &BuildProduct) -> Result<PackagedArtifact> {
        if !product.output_dir.is_dir() {
            return Err(ReleaseError::ArtifactNotFound {
                path: product.output_dir.clone(),
            });
        }
        let artifact = product.artifact_path();
        if !artifact.exists() {
            return Err(ReleaseError::ArtifactNotFound { path: artifact });
        }

        fs::create_dir_all(&self.dist_dir)?;
        let asset_name = format!("{}.{ARCHIVE_EXTENSION}", product.artifact_name);
        let archive_path = self.dist_dir.join(&asset_name);

        create_archive(&artifact, &archive_path)?;
        let checksum = compute_sha256(&archive_path)?;
        log::info!("packaged {archive_path} (sha256 {checksum})");

        Ok(PackagedArtifact {
            archive_path,
            asset_name,
            checksum,
        })
    }
}

/// Compute the SHA-256 digest of a file.
///
/// # Errors
///
/// Returns [`PackagingError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Utf8Path) -> std::result::Result<Sha256Digest, PackagingError> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(Sha256Digest::from_hasher(hasher))
}

/// Create a zip archive of `source` at `archive_path`.
///
/// Entries are rooted at the final component of `source`, so archiving
/// `generated/Foo.xcframework` yields entries beneath `Foo.xcframework/`.
/// The archive is assembled in a temporary file beside `archive_path` and
/// renamed into place once complete.
///
/// # Errors
///
/// Returns [`PackagingError`] if the tree cannot be walked, contains an
/// entry that cannot be stored, or the archive cannot be written.
pub fn create_archive(
    source: &Utf8Path,
    archive_path: &Utf8Path,
) -> std::result::Result<(), PackagingError> {
    let root_name = source
        .file_name()
        .ok_or_else(|| PackagingError::UnsupportedEntry(source.as_std_path().to_path_buf()))?;
    let parent = archive_path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));

    let mut staged = NamedTempFile::new_in(parent)?;
    {
        let mut writer = ZipWriter::new(staged.as_file_mut());
        add_entry(&mut writer, source.as_std_path(), root_name)?;
        writer.finish()?;
    }
    staged.as_file().sync_all()?;
    staged
        .persist(archive_path)
        .map_err(|e| PackagingError::Io(e.error))?;
    Ok(())
}

fn entry_options(mode: u32) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(mode)
}

fn add_entry<W: Write + io::Seek>(
    writer: &mut ZipWriter<W>,
    path: &Path,
    name: &str,
) -> std::result::Result<(), PackagingError> {
    let metadata = fs::symlink_metadata(path)?;
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        let target = fs::read_link(path)?;
        let target = target
            .to_str()
            .ok_or_else(|| PackagingError::NonUtf8Path(target.clone()))?;
        writer.add_symlink(name, target, entry_options(EXECUTABLE_MODE))?;
    } else if file_type.is_dir() {
        writer.add_directory(format!("{name}/"), entry_options(EXECUTABLE_MODE))?;
        for (child_name, child_path) in sorted_children(path)? {
            add_entry(writer, &child_path, &format!("{name}/{child_name}"))?;
        }
    } else if file_type.is_file() {
        writer.start_file(name, entry_options(file_mode(&metadata)))?;
        let mut file = fs::File::open(path)?;
        io::copy(&mut file, writer)?;
    } else {
        return Err(PackagingError::UnsupportedEntry(path.to_path_buf()));
    }
    Ok(())
}

fn sorted_children(
    dir: &Path,
) -> std::result::Result<Vec<(String, std::path::PathBuf)>, PackagingError> {
    let mut children = fs::read_dir(dir)?
        .map(|entry| -> std::result::Result<_, PackagingError> {
            let entry = entry?;
            let path = entry.path();
            let name = entry
                .file_name()
                .into_string()
                .map_err(|_| PackagingError::NonUtf8Path(path.clone()))?;
            Ok((name, path))
        })
        .collect::<std::result::Result<Vec<_>, PackagingError>>()?;
    children.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(children)
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    if metadata.permissions().mode() & 0o111 == 0 {
        REGULAR_MODE
    } else {
        EXECUTABLE_MODE
    }
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> u32 {
    REGULAR_MODE
}

#[cfg(test)]
#[path = "packaging_tests.rs"]
mod tests;
