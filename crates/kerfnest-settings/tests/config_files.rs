use kerfnest_settings::{Config, ConfigError, SettingsError};
use tempfile::TempDir;

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = Config::default();
    config.kerf.kerf_width = 0.25;
    config.nesting.rotation_increment_deg = 90.0;
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.material.width = 1220.0;
    config.material.height = 2440.0;
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.material.width, 1220.0);
    assert_eq!(loaded.material.height, 2440.0);
}

#[test]
fn test_unknown_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    let result = Config::default().save_to_file(&path);
    assert!(matches!(
        result,
        Err(SettingsError::Config(ConfigError::UnsupportedFormat(_)))
    ));
}

#[test]
fn test_invalid_file_is_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[material]\nwidth = -5.0\n").unwrap();
    assert!(Config::load_from_file(&path).is_err());
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
}
