use sdm::core::disk_monitor::{scan_volumes, Severity, Volume};
use sdm::core::Config;

use super::support::FakeProbe;

#[test]
fn test_scan_classifies_every_volume() {
    let probe = FakeProbe::new();
    probe.set_percent("/", 30);
    probe.set_percent("/home", 76);

    let statuses = scan_volumes(&probe, &Config::default());
    let tiers: Vec<(Volume, Severity)> = statuses
        .iter()
        .map(|s| (s.volume.clone(), s.severity))
        .collect();

    assert_eq!(
        tiers,
        vec![
            (Volume::new("/"), Severity::Normal),
            (Volume::new("/home"), Severity::Warning),
        ]
    );
}

#[test]
fn test_scan_honors_configured_volumes() {
    let probe = FakeProbe::new();
    probe.set_percent("/", 30);
    probe.set_percent("/home", 76);

    let config = Config {
        drives_to_monitor: vec!["/home".to_string(), "/missing".to_string()],
        ..Default::default()
    };

    let statuses = scan_volumes(&probe, &config);
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].volume, Volume::new("/home"));
}

#[test]
fn test_scan_skips_volumes_that_fail_to_sample() {
    let probe = FakeProbe::new();
    probe.set_failing("/broken");
    probe.set_percent("/ok", 61);

    let statuses = scan_volumes(&probe, &Config::default());
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].severity, Severity::Notice);
}

#[test]
fn test_status_json_shape() {
    let probe = FakeProbe::new();
    probe.set_percent("/data", 92);

    let statuses = scan_volumes(&probe, &Config::default());
    let json = serde_json::to_value(&statuses).unwrap();

    assert_eq!(json[0]["volume"], "/data");
    assert_eq!(json[0]["severity"], "critical");
    assert_eq!(json[0]["snapshot"]["percent"], 92.0);
    assert_eq!(json[0]["snapshot"]["total"], 1000);
}
