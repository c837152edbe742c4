//! Mirroring of generated bindings into the package checkout.
//!
//! The package carries a copy of the Swift sources generated alongside the
//! framework. After a mirror the destination holds exactly the source tree:
//! new files are added, changed files replaced and files that no longer exist
//! upstream are removed.

use crate::error::{ReleaseError, Result};
use camino::Utf8Path;
use std::fs;
use std::io;
use std::path::Path;
use tempfile::TempDir;

/// Replace `destination` with a copy of `source`.
///
/// The copy is assembled in a staging directory beside `destination` and
/// swapped in once complete, so a failed copy leaves the previous contents
/// in place.
///
/// # Errors
///
/// Returns [`ReleaseError::ArtifactNotFound`] if `source` is not a directory,
/// or [`ReleaseError::Io`] if the copy or swap fails.
pub fn mirror_directory(source: &Utf8Path, destination: &Utf8Path) -> Result<()> {
    if !source.is_dir() {
        return Err(ReleaseError::ArtifactNotFound {
            path: source.to_owned(),
        });
    }
    let parent = destination
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(parent)?;

    let staging = TempDir::new_in(parent)?;
    let staged_tree = staging.path().join("tree");
    copy_tree(source.as_std_path(), &staged_tree)?;

    match fs::remove_dir_all(destination) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::rename(&staged_tree, destination)?;
    log::debug!("mirrored {source} into {destination}");
    Ok(())
}

fn copy_tree(source: &Path, destination: &Path) -> io::Result<()> {
    fs::create_dir(destination)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            copy_symlink(&entry.path(), &target)?;
        } else if file_type.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(link)?, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
    fs::copy(link, target).map(drop)
}
