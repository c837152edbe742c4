//! Behaviour-driven tests for package manifest rewriting.
//!
//! These scenarios exercise `PackageManifest` and `ManifestUpdater` against
//! a package checkout in a temporary directory. Tests use the rstest-bdd
//! v0.5.0 mutable world pattern.

use camino::{Utf8Path, Utf8PathBuf};
use components_release::config::ManifestSettings;
use components_release::error::ReleaseError;
use components_release::manifest::{ManifestUpdater, PackageManifest, download_url};
use components_release::model::{
    BranchName, BuildProduct, CommitHash, PackagedArtifact, ReleaseVersion, RepositoryRef,
    Sha256Digest,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::fs;
use tempfile::TempDir;

const ASSET: &str = "MatrixSDKFFI.xcframework.zip";

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ManifestWorld {
    temp_dir: Option<TempDir>,
    original: String,
    error: Option<ReleaseError>,
}

#[fixture]
fn world() -> ManifestWorld {
    ManifestWorld {
        temp_dir: Some(TempDir::new().expect("temp dir")),
        ..ManifestWorld::default()
    }
}

fn root(world: &ManifestWorld) -> Utf8PathBuf {
    let path = world.temp_dir.as_ref().expect("temp_dir set").path();
    Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("utf8 temp dir")
}

fn package_dir(world: &ManifestWorld) -> Utf8PathBuf {
    root(world).join("package")
}

fn generated_dir(world: &ManifestWorld) -> Utf8PathBuf {
    root(world).join("build/generated")
}

fn package_repository() -> RepositoryRef {
    RepositoryRef::new("owner", "matrix-rust-components-swift").expect("repository")
}

fn write_manifest(world: &mut ManifestWorld, contents: String) {
    let package = package_dir(world);
    fs::create_dir_all(&package).expect("create package");
    fs::write(package.join("Package.swift"), &contents).expect("write manifest");
    world.original = contents;
}

fn manifest_text(world: &ManifestWorld) -> String {
    fs::read_to_string(package_dir(world).join("Package.swift")).expect("read manifest")
}

fn artifact_for(world: &ManifestWorld, version: &ReleaseVersion) -> PackagedArtifact {
    PackagedArtifact {
        archive_path: root(world).join("dist").join(ASSET),
        asset_name: ASSET.to_owned(),
        checksum: Sha256Digest::of_bytes(version.as_str().as_bytes()),
    }
}

fn record(world: &mut ManifestWorld, result: Result<(), ReleaseError>) {
    world.error = result.err();
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a manifest declaring version \"{version}\"")]
fn given_manifest(world: &mut ManifestWorld, version: String) {
    let contents = format!(
        "// swift-tools-version:5.7\n\
         import PackageDescription\n\
         \n\
         let version = \"{version}\"\n\
         let checksum = \"{}\" // archive digest\n\
         let url = \"https://example.invalid/{version}.zip\"\n\
         \n\
         let package = Package(name: \"MatrixRustSDK\")\n",
        "0".repeat(64)
    );
    write_manifest(world, contents);
}

#[given("a manifest that interpolates the version into its url")]
fn given_interpolating_manifest(world: &mut ManifestWorld) {
    let contents = format!(
        "import PackageDescription\n\
         let checksum = \"{}\"\n\
         let version = \"v1.0.44-alpha\"\n\
         let url = \"https://github.com/owner/matrix-rust-components-swift/releases/download/\\(version)/{ASSET}\"\n",
        "0".repeat(64)
    );
    write_manifest(world, contents);
}

#[given("a manifest without a checksum declaration")]
fn given_manifest_without_checksum(world: &mut ManifestWorld) {
    write_manifest(
        world,
        "let version = \"1.0.43\"\nlet url = \"https://example.invalid/a.zip\"\n".to_owned(),
    );
}

#[given("a manifest declaring the url twice")]
fn given_manifest_with_two_urls(world: &mut ManifestWorld) {
    let contents = format!(
        "let version = \"1.0.43\"\n\
         let checksum = \"{}\"\n\
         let url = \"https://example.invalid/a.zip\"\n\
         let url = \"https://example.invalid/b.zip\"\n",
        "0".repeat(64)
    );
    write_manifest(world, contents);
}

#[given("the package carries a stale generated source \"{name}\"")]
fn given_stale_source(world: &mut ManifestWorld, name: String) {
    let sources = package_dir(world).join("Sources/MatrixRustSDK");
    fs::create_dir_all(&sources).expect("create package sources");
    fs::write(sources.join(name), "// stale").expect("write stale source");
}

#[given("the build produced a generated source \"{name}\"")]
fn given_generated_source(world: &mut ManifestWorld, name: String) {
    let swift = generated_dir(world).join("swift");
    fs::create_dir_all(&swift).expect("create generated sources");
    fs::write(swift.join(name), "// generated").expect("write generated source");
}

#[when("the manifest is rewritten for version \"{version}\"")]
fn when_manifest_rewritten(world: &mut ManifestWorld, version: String) {
    let version = ReleaseVersion::try_from(version.as_str()).expect("version");
    let artifact = artifact_for(world, &version);
    let repository = package_repository();
    let settings = ManifestSettings::default();
    let fields = ManifestUpdater::new(&settings).fields_for(&repository, &version, &artifact);
    let mut manifest = PackageManifest::new(package_dir(world), repository, "Package.swift");
    let result = manifest.apply(fields);
    record(world, result);
}

#[when("the package is updated for version \"{version}\"")]
fn when_package_updated(world: &mut ManifestWorld, version: String) {
    let version = ReleaseVersion::try_from(version.as_str()).expect("version");
    let product = BuildProduct {
        source_repository: RepositoryRef::new("owner", "matrix-rust-sdk").expect("repository"),
        version: version.clone(),
        commit: CommitHash::try_from("abc1234").expect("commit"),
        branch: BranchName::try_from("main").expect("branch"),
        output_dir: generated_dir(world),
        artifact_name: "MatrixSDKFFI.xcframework".to_owned(),
    };
    let artifact = artifact_for(world, &version);
    let settings = ManifestSettings::default();
    let mut manifest =
        PackageManifest::new(package_dir(world), package_repository(), "Package.swift");
    let result = ManifestUpdater::new(&settings)
        .update(&mut manifest, &product, &artifact)
        .map(|_| ());
    record(world, result);
}

#[then("the manifest declares version \"{version}\"")]
fn then_manifest_declares(world: &mut ManifestWorld, version: String) {
    assert!(world.error.is_none(), "unexpected error: {:?}", world.error);
    let text = manifest_text(world);
    assert!(
        text.contains(&format!("let version = \"{version}\"\n")),
        "manifest does not declare {version}:\n{text}"
    );
}

#[then("the manifest url points at the \"{tag}\" release asset")]
fn then_manifest_url(world: &mut ManifestWorld, tag: String) {
    let expected = download_url("https://github.com", &package_repository(), &tag, ASSET);
    assert!(manifest_text(world).contains(&format!("let url = \"{expected}\"")));
}

#[then("the manifest keeps its other lines")]
fn then_other_lines_kept(world: &mut ManifestWorld) {
    let text = manifest_text(world);
    let kept = |line: &&str| !line.starts_with("let version") && !line.starts_with("let url");
    let before: Vec<&str> = world.original.lines().filter(kept).collect();
    let after: Vec<&str> = text.lines().filter(kept).collect();
    assert_eq!(before.len(), after.len());
    for (old, new) in before.iter().zip(&after) {
        if old.starts_with("let checksum") {
            assert!(new.ends_with("\" // archive digest"), "comment lost: {new}");
        } else {
            assert_eq!(old, new);
        }
    }
}

#[then("the manifest url still interpolates the version")]
fn then_url_interpolates(world: &mut ManifestWorld) {
    let text = manifest_text(world);
    assert!(
        text.contains(&format!("/releases/download/\\(version)/{ASSET}\"")),
        "interpolation lost:\n{text}"
    );
}

#[then("the rewrite fails naming \"{field}\"")]
fn then_rewrite_fails(world: &mut ManifestWorld, field: String) {
    match world.error.as_ref() {
        Some(ReleaseError::ManifestFormatMismatch { reason, .. }) => {
            assert!(reason.contains(&field), "reason {reason:?} lacks {field}");
        }
        other => panic!("expected a manifest format mismatch, got {other:?}"),
    }
}

#[then("the manifest on disk is unchanged")]
fn then_manifest_unchanged(world: &mut ManifestWorld) {
    assert_eq!(manifest_text(world), world.original);
}

#[then("the package sources contain \"{name}\"")]
fn then_sources_contain(world: &mut ManifestWorld, name: String) {
    assert!(sources_dir(world).join(name).is_file());
}

#[then("the package sources do not contain \"{name}\"")]
fn then_sources_lack(world: &mut ManifestWorld, name: String) {
    assert!(!sources_dir(world).join(name).exists());
}

fn sources_dir(world: &ManifestWorld) -> Utf8PathBuf {
    package_dir(world).join(Utf8Path::new("Sources/MatrixRustSDK"))
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/manifest.feature",
    name = "Every release field is rewritten"
)]
fn scenario_rewrite_all_fields(world: ManifestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/manifest.feature",
    name = "A url that interpolates the version keeps the interpolation"
)]
fn scenario_interpolated_url(world: ManifestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/manifest.feature",
    name = "A manifest without a checksum is rejected"
)]
fn scenario_missing_checksum(world: ManifestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/manifest.feature",
    name = "A manifest declaring the url twice is rejected"
)]
fn scenario_duplicated_url(world: ManifestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/manifest.feature",
    name = "Generated sources replace the packaged sources"
)]
fn scenario_sources_replaced(world: ManifestWorld) {
    let _ = world;
}
