use sdm::core::{Config, ConfigStore, ConfigUpdate};
use std::time::Duration;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> ConfigStore {
    ConfigStore::new(dir.path().join("sdm").join("config.json"))
}

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.notice_threshold, 60);
    assert_eq!(config.warning_threshold, 75);
    assert_eq!(config.critical_threshold, 90);
    assert_eq!(config.check_interval(), Duration::from_secs(300));
    assert!(config.drives_to_monitor.is_empty());
    assert!(!config.silent_mode);
    assert!(!config.run_at_startup);
}

#[test]
fn test_missing_file_is_created_with_defaults() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let config = store.load();
    assert_eq!(config, Config::default());
    assert!(store.path().exists());

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(on_disk["critical_threshold"], 90);
    assert_eq!(on_disk["check_interval"], 5.0);
}

#[test]
fn test_corrupt_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), "{ not json").unwrap();

    assert_eq!(store.load(), Config::default());
    // The broken file is left for the user to fix
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{ not json");
}

#[test]
fn test_invalid_thresholds_fall_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(
        store.path(),
        r#"{"notice_threshold": 80, "warning_threshold": 70, "critical_threshold": 90}"#,
    )
    .unwrap();

    assert_eq!(store.load(), Config::default());
}

#[test]
fn test_roundtrip_through_store() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let config = Config {
        notice_threshold: 50,
        check_interval: 0.5,
        drives_to_monitor: vec!["/".to_string(), "/home".to_string()],
        silent_mode: true,
        ..Default::default()
    };
    store.save(&config).unwrap();

    let loaded = store.load();
    assert_eq!(loaded, config);
    assert_eq!(loaded.check_interval(), Duration::from_secs(30));
}

#[test]
fn test_rejected_update_leaves_config_unchanged() {
    let config = Config::default();
    let update = ConfigUpdate {
        critical_threshold: Some(70),
        ..Default::default()
    };

    assert!(config.with_update(&update).is_err());
    assert_eq!(config, Config::default());
}

#[test]
fn test_update_can_clear_drive_list() {
    let config = Config {
        drives_to_monitor: vec!["/data".to_string()],
        ..Default::default()
    };
    let update = ConfigUpdate {
        drives_to_monitor: Some(vec![String::new()]),
        ..Default::default()
    };

    let next = config.with_update(&update).unwrap();
    assert!(next.drives_to_monitor.is_empty());
}
