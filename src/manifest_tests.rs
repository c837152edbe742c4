//! Unit tests for manifest rewriting.

use super::*;
use crate::model::{BranchName, CommitHash};
use rstest::{fixture, rstest};
use tempfile::TempDir;

/// The layout the Swift package ships with: checksum first and a url that
/// interpolates the version constant.
const INTERPOLATED_MANIFEST: &str = r#"// swift-tools-version:5.9
import PackageDescription
let checksum = "39a11614a69b856f01e8ac1f8a4a1fadac9ef0d4b1b2695edee513c46ba6d204"
let version = "v1.0.44-alpha"
let url = "https://github.com/Ruchit-Xaana/matrix-rust-components-swift/releases/download/\(version)/MatrixSDKFFI.xcframework.zip"
let package = Package(
    name: "MatrixRustSDK",
    targets: [
        .binaryTarget(name: "MatrixSDKFFI", url: url, checksum: checksum),
    ]
)
"#;

const MANIFEST: &str = r#"// swift-tools-version:5.7
import PackageDescription

let version = "v1.0.43"
let checksum = "0000000000000000000000000000000000000000000000000000000000000000"
let url = "https://github.com/Ruchit-Xaana/matrix-rust-components-swift/releases/download/v1.0.43/MatrixSDKFFI.xcframework.zip" // keep

let package = Package(
    name: "MatrixRustSDK",
    targets: [
        .binaryTarget(name: "MatrixSDKFFI", url: url, checksum: checksum),
    ]
)
"#;

fn package_repo() -> RepositoryRef {
    RepositoryRef::new("Ruchit-Xaana", "matrix-rust-components-swift").expect("repo")
}

#[fixture]
fn fields() -> ManifestFields {
    ManifestFields {
        version: "v1.0.44".to_owned(),
        checksum: Sha256Digest::of_bytes(b"archive"),
        url: download_url(
            "https://github.com",
            &package_repo(),
            "v1.0.44",
            "MatrixSDKFFI.xcframework.zip",
        ),
    }
}

#[rstest]
fn rewrite_replaces_only_the_literals(fields: ManifestFields) {
    let rewritten = rewrite_manifest(MANIFEST, &fields).expect("rewrite succeeds");

    assert!(rewritten.contains("let version = \"v1.0.44\"\n"));
    assert!(rewritten.contains(&format!("let checksum = \"{}\"\n", fields.checksum)));
    assert!(rewritten.contains(
        "releases/download/v1.0.44/MatrixSDKFFI.xcframework.zip\" // keep\n"
    ));
    assert!(rewritten.contains("url: url, checksum: checksum"));
    assert_eq!(
        rewritten.lines().count(),
        MANIFEST.lines().count(),
        "no lines added or removed"
    );
}

#[rstest]
fn rewrite_keeps_the_version_interpolation_in_the_url(fields: ManifestFields) {
    let rewritten = rewrite_manifest(INTERPOLATED_MANIFEST, &fields).expect("rewrite succeeds");

    let expected = INTERPOLATED_MANIFEST
        .replace("v1.0.44-alpha", "v1.0.44")
        .replace(
            "39a11614a69b856f01e8ac1f8a4a1fadac9ef0d4b1b2695edee513c46ba6d204",
            fields.checksum.as_str(),
        );
    assert_eq!(rewritten, expected);
    assert!(rewritten.contains("/releases/download/\\(version)/MatrixSDKFFI.xcframework.zip\""));
    assert_eq!(
        rewrite_manifest(&rewritten, &fields).expect("second rewrite"),
        rewritten
    );
}

#[rstest]
fn rewrite_is_idempotent(fields: ManifestFields) {
    let once = rewrite_manifest(MANIFEST, &fields).expect("first rewrite");
    let twice = rewrite_manifest(&once, &fields).expect("second rewrite");
    assert_eq!(once, twice);
}

#[rstest]
fn rewrite_preserves_crlf_line_endings(fields: ManifestFields) {
    let crlf = MANIFEST.replace('\n', "\r\n");
    let rewritten = rewrite_manifest(&crlf, &fields).expect("rewrite succeeds");

    assert!(rewritten.contains("let version = \"v1.0.44\"\r\n"));
    assert_eq!(rewritten.matches("\r\n").count(), crlf.matches("\r\n").count());
}

#[rstest]
#[case::missing_checksum(MANIFEST.replace("let checksum", "var checksum"), ManifestFieldError::Missing("checksum"))]
#[case::duplicated_version(
    format!("{MANIFEST}let version = \"0.0.1\"\n"),
    ManifestFieldError::Duplicated { field: "version", count: 2 }
)]
fn rewrite_rejects_malformed_manifests(
    fields: ManifestFields,
    #[case] contents: String,
    #[case] expected: ManifestFieldError,
) {
    assert_eq!(rewrite_manifest(&contents, &fields), Err(expected));
}

#[rstest]
#[case::commented_out("// let version = \"1.0.0\"", "version", false)]
#[case::longer_name("let versionString = \"1.0.0\"", "version", false)]
#[case::tight_spacing("let version=\"1.0.0\"", "version", true)]
#[case::indented("    let url = \"x\"", "url", true)]
#[case::missing_space("letversion = \"1.0.0\"", "version", false)]
fn literal_span_matches_declarations_only(
    #[case] line: &str,
    #[case] field: &str,
    #[case] matches: bool,
) {
    assert_eq!(literal_span(line, field).is_some(), matches);
}

#[rstest]
fn apply_leaves_a_mismatched_manifest_untouched(fields: ManifestFields) {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8Path::from_path(dir.path()).expect("utf8 temp dir");
    let original = MANIFEST.replace("let url", "var url");
    fs::write(root.join("Package.swift"), &original).expect("write manifest");

    let mut manifest = PackageManifest::new(root, package_repo(), "Package.swift");
    let err = manifest.apply(fields).expect_err("mismatch should fail");

    assert!(matches!(
        err,
        ReleaseError::ManifestFormatMismatch { ref reason, .. } if reason.contains("url")
    ));
    assert_eq!(
        fs::read_to_string(root.join("Package.swift")).expect("read manifest"),
        original
    );
    assert!(manifest.fields().is_none());
}

#[rstest]
fn updater_mirrors_sources_then_rewrites_the_manifest() {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8Path::from_path(dir.path()).expect("utf8 temp dir");
    let output = root.join("source/bindings/apple/generated");
    fs::create_dir_all(output.join("swift")).expect("create generated sources");
    fs::write(output.join("swift/MatrixRustSDK.swift"), "// generated").expect("write source");
    let package = root.join("package");
    fs::create_dir_all(&package).expect("create package");
    fs::write(package.join("Package.swift"), MANIFEST).expect("write manifest");

    let product = BuildProduct {
        source_repository: RepositoryRef::new("Ruchit-Xaana", "matrix-rust-sdk").expect("repo"),
        version: ReleaseVersion::try_from("1.0.44").expect("version"),
        commit: CommitHash::try_from("abc1234").expect("hash"),
        branch: BranchName::try_from("main").expect("branch"),
        output_dir: output,
        artifact_name: "MatrixSDKFFI.xcframework".to_owned(),
    };
    let artifact = PackagedArtifact {
        archive_path: root.join("dist/MatrixSDKFFI.xcframework.zip"),
        asset_name: "MatrixSDKFFI.xcframework.zip".to_owned(),
        checksum: Sha256Digest::of_bytes(b"archive"),
    };
    let settings = ManifestSettings::default();
    let mut manifest = PackageManifest::new(&package, package_repo(), "Package.swift");

    let fields = ManifestUpdater::new(&settings)
        .update(&mut manifest, &product, &artifact)
        .expect("update succeeds");

    assert_eq!(fields.version, "v1.0.44");
    assert_eq!(
        fields.url,
        "https://github.com/Ruchit-Xaana/matrix-rust-components-swift/releases/download/v1.0.44/MatrixSDKFFI.xcframework.zip"
    );
    assert_eq!(manifest.fields(), Some(&fields));
    assert!(package.join("Sources/MatrixRustSDK/MatrixRustSDK.swift").is_file());
    let written = fs::read_to_string(package.join("Package.swift")).expect("read manifest");
    assert!(written.contains(&format!("let checksum = \"{}\"", artifact.checksum)));
}

#[rstest]
fn updater_does_not_mirror_when_the_manifest_is_malformed() {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8Path::from_path(dir.path()).expect("utf8 temp dir");
    let output = root.join("generated");
    fs::create_dir_all(output.join("swift")).expect("create generated sources");
    let package = root.join("package");
    fs::create_dir_all(&package).expect("create package");
    fs::write(package.join("Package.swift"), "// empty manifest\n").expect("write manifest");

    let product = BuildProduct {
        source_repository: RepositoryRef::new("Ruchit-Xaana", "matrix-rust-sdk").expect("repo"),
        version: ReleaseVersion::try_from("1.0.44").expect("version"),
        commit: CommitHash::try_from("abc1234").expect("hash"),
        branch: BranchName::try_from("main").expect("branch"),
        output_dir: output,
        artifact_name: "MatrixSDKFFI.xcframework".to_owned(),
    };
    let artifact = PackagedArtifact {
        archive_path: root.join("dist/MatrixSDKFFI.xcframework.zip"),
        asset_name: "MatrixSDKFFI.xcframework.zip".to_owned(),
        checksum: Sha256Digest::of_bytes(b"archive"),
    };
    let settings = ManifestSettings::default();
    let mut manifest = PackageManifest::new(&package, package_repo(), "Package.swift");

    let err = ManifestUpdater::new(&settings)
        .update(&mut manifest, &product, &artifact)
        .expect_err("malformed manifest should fail");

    assert!(matches!(err, ReleaseError::ManifestFormatMismatch { .. }));
    assert!(!package.join("Sources").exists());
}

#[rstest]
fn fields_use_the_configured_download_host() {
    let settings = ManifestSettings {
        download_host: "https://github.example.com/".to_owned(),
        ..ManifestSettings::default()
    };
    let artifact = PackagedArtifact {
        archive_path: Utf8PathBuf::from("dist/MatrixSDKFFI.xcframework.zip"),
        asset_name: "MatrixSDKFFI.xcframework.zip".to_owned(),
        checksum: Sha256Digest::of_bytes(b"archive"),
    };
    let version = ReleaseVersion::try_from("1.0.44").expect("version");

    let fields = ManifestUpdater::new(&settings).fields_for(&package_repo(), &version, &artifact);

    assert_eq!(fields.version, "v1.0.44");
    assert_eq!(
        fields.url,
        "https://github.example.com/Ruchit-Xaana/matrix-rust-components-swift/releases/download/v1.0.44/MatrixSDKFFI.xcframework.zip"
    );
}
