//! Loading manifests from inline text and from files.

mod common;

use std::path::PathBuf;

use cloud_lib_rust::descriptor::{ApiManifest, DescriptorError};
use common::NOVA;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn scratch_file(extension: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("manifest-{}.{}", uuid::Uuid::new_v4(), extension));
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_inline_json_matches_yaml() {
    let json = std::fs::read_to_string(fixture("nova.json")).unwrap();
    let from_json = ApiManifest::from_json_str(&json).unwrap();
    let from_yaml = ApiManifest::from_yaml_str(NOVA).unwrap();
    assert_eq!(from_json.id, "nova");
    assert_eq!(from_json.name.as_deref(), Some("OpenStack Compute"));
    assert_eq!(from_json.descriptors().unwrap(), from_yaml.descriptors().unwrap());
}

#[test]
fn test_inline_json_syntax_error() {
    let err = ApiManifest::from_json_str("id: nova").unwrap_err();
    assert!(matches!(err, DescriptorError::LoadError { ref path, .. } if path == "<inline json>"));
}

#[tokio::test]
async fn test_load_json_and_yaml_files() {
    let from_json = ApiManifest::load_from_file(fixture("nova.json")).await.unwrap();
    let from_yaml = ApiManifest::load_from_file(fixture("nova.yaml")).await.unwrap();
    let descriptors = from_json.descriptors().unwrap();
    assert_eq!(descriptors.len(), 5);
    assert_eq!(descriptors[2].operation, "securityGroups.create");
    assert_eq!(descriptors, from_yaml.descriptors().unwrap());
}

#[tokio::test]
async fn test_extension_selects_parser() {
    // YAML text is rejected by the JSON parser...
    let json_path = scratch_file("json", NOVA);
    let err = ApiManifest::load_from_file(&json_path).await.unwrap_err();
    std::fs::remove_file(&json_path).unwrap();
    match err {
        DescriptorError::LoadError { path, .. } => assert!(path.ends_with(".json")),
        other => panic!("unexpected error: {other:?}"),
    }

    // ...and the same text loads once the extension says YAML.
    for extension in ["yaml", "yml", "manifest"] {
        let path = scratch_file(extension, NOVA);
        let manifest = ApiManifest::load_from_file(&path).await;
        std::fs::remove_file(&path).unwrap();
        assert_eq!(manifest.unwrap().operations.len(), 5);
    }

    let upper = scratch_file("JSON", "{\"id\": \"x\", \"operations\": []}");
    let manifest = ApiManifest::load_from_file(&upper).await;
    std::fs::remove_file(&upper).unwrap();
    assert!(manifest.unwrap().operations.is_empty());
}

#[tokio::test]
async fn test_missing_file_is_load_error() {
    let missing = fixture("does-not-exist.yaml");
    let err = ApiManifest::load_from_file(&missing).await.unwrap_err();
    match err {
        DescriptorError::LoadError { path, .. } => assert!(path.ends_with("does-not-exist.yaml")),
        other => panic!("unexpected error: {other:?}"),
    }
}
