//! Unit tests for the artifact packaging module.

use super::*;
use crate::model::{BranchName, CommitHash, ReleaseVersion, RepositoryRef};
use rstest::{fixture, rstest};
use std::fs::File;
use tempfile::TempDir;
use zip::ZipArchive;

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("temp dir creation succeeds")
}

fn utf8(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir")
}

/// Lay out a small framework tree beneath `<root>/generated`.
fn framework_tree(root: &Utf8Path) -> Utf8PathBuf {
    let output = root.join("generated");
    let framework = output.join("MatrixSDKFFI.xcframework");
    let slice = framework.join("ios-arm64");
    fs::create_dir_all(&slice).expect("create slice dir");
    fs::write(framework.join("Info.plist"), b"<plist/>").expect("write plist");
    fs::write(slice.join("libmatrix_sdk_ffi.a"), b"\x7fELF archive").expect("write lib");
    output
}

fn product(output_dir: Utf8PathBuf) -> BuildProduct {
    BuildProduct {
        source_repository: RepositoryRef::new("Ruchit-Xaana", "matrix-rust-sdk").expect("repo"),
        version: ReleaseVersion::try_from("1.0.44").expect("version"),
        commit: CommitHash::try_from("abc1234").expect("hash"),
        branch: BranchName::try_from("main").expect("branch"),
        output_dir,
        artifact_name: "MatrixSDKFFI.xcframework".to_owned(),
    }
}

fn entry_names(path: &Utf8Path) -> Vec<String> {
    let file = File::open(path).expect("open archive");
    let mut archive = ZipArchive::new(file).expect("read archive");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("entry").name().to_owned())
        .collect()
}

#[rstest]
fn compute_sha256_of_known_content(temp_dir: TempDir) {
    let path = utf8(&temp_dir).join("empty.bin");
    fs::write(&path, b"").expect("write");
    let digest = compute_sha256(&path).expect("sha256 succeeds");
    assert_eq!(
        digest.as_str(),
        concat!(
            "e3b0c44298fc1c149afbf4c8996fb924",
            "27ae41e4649b934ca495991b7852b855"
        )
    );
}

#[rstest]
fn package_roots_entries_at_the_artifact_name(temp_dir: TempDir) {
    let root = utf8(&temp_dir);
    let output = framework_tree(&root);
    let packager = ArtifactPackager::new(root.join("dist"));

    let packaged = packager.package(&product(output)).expect("package succeeds");

    assert_eq!(packaged.asset_name, "MatrixSDKFFI.xcframework.zip");
    assert_eq!(
        packaged.archive_path,
        root.join("dist/MatrixSDKFFI.xcframework.zip")
    );
    assert_eq!(
        entry_names(&packaged.archive_path),
        [
            "MatrixSDKFFI.xcframework/",
            "MatrixSDKFFI.xcframework/Info.plist",
            "MatrixSDKFFI.xcframework/ios-arm64/",
            "MatrixSDKFFI.xcframework/ios-arm64/libmatrix_sdk_ffi.a",
        ]
    );
}

#[rstest]
fn checksum_matches_the_bytes_on_disk(temp_dir: TempDir) {
    let root = utf8(&temp_dir);
    let output = framework_tree(&root);
    let packaged = ArtifactPackager::new(root.join("dist"))
        .package(&product(output))
        .expect("package succeeds");

    let bytes = fs::read(&packaged.archive_path).expect("read archive");
    assert_eq!(packaged.checksum, Sha256Digest::of_bytes(&bytes));
}

#[rstest]
fn repackaging_the_same_tree_is_deterministic(temp_dir: TempDir) {
    let root = utf8(&temp_dir);
    let output = framework_tree(&root);

    let first = ArtifactPackager::new(root.join("dist-a"))
        .package(&product(output.clone()))
        .expect("first package");
    let second = ArtifactPackager::new(root.join("dist-b"))
        .package(&product(output))
        .expect("second package");

    assert_eq!(first.checksum, second.checksum);
}

#[rstest]
fn package_replaces_a_previous_archive(temp_dir: TempDir) {
    let root = utf8(&temp_dir);
    let output = framework_tree(&root);
    let dist = root.join("dist");
    fs::create_dir_all(&dist).expect("create dist");
    fs::write(dist.join("MatrixSDKFFI.xcframework.zip"), b"stale").expect("write stale");

    let packaged = ArtifactPackager::new(&dist)
        .package(&product(output))
        .expect("package succeeds");

    let bytes = fs::read(&packaged.archive_path).expect("read archive");
    assert_ne!(bytes, b"stale");
    assert_eq!(packaged.checksum, Sha256Digest::of_bytes(&bytes));
}

#[rstest]
fn missing_output_directory_is_artifact_not_found(temp_dir: TempDir) {
    let root = utf8(&temp_dir);
    let err = ArtifactPackager::new(root.join("dist"))
        .package(&product(root.join("generated")))
        .expect_err("missing output should fail");

    assert!(matches!(
        err,
        ReleaseError::ArtifactNotFound { ref path } if path == &root.join("generated")
    ));
    assert!(!root.join("dist").exists(), "no archive should be produced");
}

#[rstest]
fn missing_artifact_is_artifact_not_found(temp_dir: TempDir) {
    let root = utf8(&temp_dir);
    let output = root.join("generated");
    fs::create_dir_all(&output).expect("create output dir");

    let err = ArtifactPackager::new(root.join("dist"))
        .package(&product(output.clone()))
        .expect_err("missing artifact should fail");

    assert!(matches!(
        err,
        ReleaseError::ArtifactNotFound { ref path }
            if path == &output.join("MatrixSDKFFI.xcframework")
    ));
}

#[cfg(unix)]
#[rstest]
fn symlinks_are_stored_as_links(temp_dir: TempDir) {
    let root = utf8(&temp_dir);
    let output = framework_tree(&root);
    let framework = output.join("MatrixSDKFFI.xcframework");
    std::os::unix::fs::symlink("Info.plist", framework.join("Current")).expect("symlink");

    let packaged = ArtifactPackager::new(root.join("dist"))
        .package(&product(output))
        .expect("package succeeds");

    let file = File::open(&packaged.archive_path).expect("open archive");
    let mut archive = ZipArchive::new(file).expect("read archive");
    let link = archive
        .by_name("MatrixSDKFFI.xcframework/Current")
        .expect("link entry");
    let mode = link.unix_mode().expect("unix mode recorded");
    assert_eq!(mode & 0o170_000, 0o120_000, "entry should be a symlink");
}
