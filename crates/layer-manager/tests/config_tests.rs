//! Viewer config loading from YAML.

use std::io::Write;

use layer_manager::{StaticSourceConfig, ViewerConfig};
use tempfile::NamedTempFile;
use wmts_common::{CrsCode, ViewerError};

const ARCTIC_YAML: &str = r#"
projection: "EPSG:3413"
max_zoom_levels: 7
endpoint_url: "${ARCTIC_TEST_ENDPOINT:-./wmts.cgi?}"
capabilities_url: "./getCapabilities.xml"
base_url: "${ARCTIC_TEST_BASE}"
static_layers:
  - identifier: blue_marble
    kind: wms
    url: "../wms/epsg3413/wms.cgi"
    layers: BlueMarble_ShadedRelief
    format: image/jpeg
  - identifier: graticule
    kind: wmts
    visible: false
    url: "./wmts.cgi?"
    format: image/png
    matrix_set: EPSG3413_1km
    origin: [-4194304, 4194304]
    resolutions: [8192, 4096, 2048]
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_yaml_with_env_substitution() {
    std::env::set_var("ARCTIC_TEST_BASE", "https://gibs.example.org/wmts/epsg3413/best/");
    std::env::remove_var("ARCTIC_TEST_ENDPOINT");

    let file = write_config(ARCTIC_YAML);
    let config = ViewerConfig::from_file(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.crs().unwrap(), CrsCode::Epsg3413);
    assert_eq!(config.endpoint_url, "./wmts.cgi?");
    assert_eq!(config.initial_zoom, 1);
    assert_eq!(config.fetch_timeout_secs, 30);
    assert_eq!(
        config.resolved_capabilities_url().unwrap(),
        "https://gibs.example.org/wmts/epsg3413/best/getCapabilities.xml"
    );

    assert_eq!(config.static_layers.len(), 2);
    assert!(config.static_layers[0].visible);
    assert!(matches!(
        &config.static_layers[0].source,
        StaticSourceConfig::Wms { version, .. } if version == "1.3.0"
    ));
    assert!(!config.static_layers[1].visible);
    match &config.static_layers[1].source {
        StaticSourceConfig::Wmts {
            tile_size, style, ..
        } => {
            assert_eq!(*tile_size, 512);
            assert_eq!(style, "default");
        }
        other => panic!("unexpected source {:?}", other),
    }
}

#[test]
fn test_missing_required_env_var() {
    let yaml = ARCTIC_YAML.replace("ARCTIC_TEST_BASE", "ARCTIC_TEST_NEVER_SET");
    std::env::remove_var("ARCTIC_TEST_NEVER_SET");

    let err = ViewerConfig::from_yaml_str(&yaml).unwrap_err();
    assert!(matches!(err, ViewerError::Config(ref m) if m.contains("ARCTIC_TEST_NEVER_SET")));
}

#[test]
fn test_missing_file() {
    let err = ViewerConfig::from_file("/nonexistent/viewer.yaml").unwrap_err();
    assert!(matches!(err, ViewerError::Config(_)));
}

#[test]
fn test_invalid_yaml() {
    let err = ViewerConfig::from_yaml_str("projection: [unclosed").unwrap_err();
    assert!(matches!(err, ViewerError::Config(_)));
}

#[test]
fn test_validate_zoom_bounds() {
    let mut config = ViewerConfig::preset("epsg3413").unwrap();
    config.initial_zoom = 9;
    assert!(config.validate().is_err());

    config.initial_zoom = 1;
    config.max_zoom_levels = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_preset_round_trips_through_yaml() {
    let preset = ViewerConfig::preset("epsg3031").unwrap();
    let yaml = serde_yaml::to_string(&preset).unwrap();
    let loaded = ViewerConfig::from_yaml_str(&yaml).unwrap();
    assert_eq!(loaded, preset);
}

#[test]
fn test_shipped_configs_validate() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config");
    for name in [
        "viewer-epsg3413.yaml",
        "viewer-epsg3857.yaml",
        "viewer-epsg4326-wms.yaml",
    ] {
        let config = ViewerConfig::from_file(dir.join(name)).unwrap();
        config.validate().unwrap();
        config.resolved_capabilities_url().unwrap();
    }
}
