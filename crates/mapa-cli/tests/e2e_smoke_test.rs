use std::{fs, path::PathBuf};

use tempfile::tempdir;

use mapa_cli::{ATLAS_FILE, Args, LAYER_FILE, run};

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn args(input: String, icons: Option<String>, output_dir: &std::path::Path) -> Args {
    Args {
        input,
        icons,
        output_dir: output_dir.to_string_lossy().to_string(),
        config: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_scene() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let args = args(
        fixture("scene.json"),
        Some(fixture("icons.json")),
        temp_dir.path(),
    );

    run(&args).expect("Scene should render");

    let png = fs::read(temp_dir.path().join(ATLAS_FILE)).expect("Atlas should be written");
    assert_eq!(&png[1..4], b"PNG");

    let layer: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp_dir.path().join(LAYER_FILE)).expect("Layer should be written"),
    )
    .unwrap();

    let features = layer["source"]["features"].as_array().unwrap();
    assert_eq!(features.len(), 4, "Every feature is projected");
    for feature in features {
        assert!(feature["properties"]["symbolCacheKey"].is_string());
    }

    let offsets = layer["style"]["icon-offset"].as_array().unwrap();
    assert_eq!(offsets[0], serde_json::json!("match"));
    for feature in features {
        let key = &feature["properties"]["symbolCacheKey"];
        assert!(offsets.contains(key), "Offset lookup misses {key}");
    }
}

#[test]
fn e2e_smoke_test_without_icons() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let args = args(fixture("scene.json"), None, temp_dir.path());

    run(&args).expect("Scene should render with the built-in icon");

    assert!(temp_dir.path().join(ATLAS_FILE).exists());
    assert!(temp_dir.path().join(LAYER_FILE).exists());
}

#[test]
fn e2e_smoke_test_missing_scene() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let args = args(
        fixture("does-not-exist.json"),
        None,
        temp_dir.path(),
    );

    assert!(matches!(run(&args), Err(mapa::MapaError::Io(_))));
}

#[test]
fn e2e_smoke_test_invalid_icons() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let icons = temp_dir.path().join("icons.json");
    fs::write(&icons, "[1, 2, 3]").unwrap();

    let args = args(
        fixture("scene.json"),
        Some(icons.to_string_lossy().to_string()),
        temp_dir.path(),
    );

    assert!(matches!(run(&args), Err(mapa::MapaError::Catalogue(_))));
}
