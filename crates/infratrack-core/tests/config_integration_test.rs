//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use infratrack_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use infratrack_core::geo::{Hemisphere, UtmZone};
use infratrack_core::formats::ImportContext;
use infratrack_core::NetworkContext;
use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const VARS: [&str; 6] = [
    "INFRATRACK_UTM_ZONE",
    "INFRATRACK_UTM_HEMISPHERE",
    "INFRATRACK_COINCIDENCE_TOLERANCE",
    "INFRATRACK_DEGENERATE_TOLERANCE",
    "INFRATRACK_MAX_SEGMENT_LENGTH",
    "INFRATRACK_NETWORK",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_default_configuration() {
    let config = LayeredConfig::with_defaults();

    assert_eq!(config.utm_zone.value, 37);
    assert_eq!(config.utm_zone.source, ConfigSource::Default);
    assert_eq!(config.utm_hemisphere.value, Hemisphere::North);
    assert_eq!(config.coincidence_tolerance_m.value, 1.0);
    assert_eq!(config.degenerate_tolerance_m.value, 0.1);
    assert_eq!(config.max_segment_length_m.value, 2000.0);
    assert_eq!(config.network.value, NetworkContext::Mixed);
    assert_eq!(config.zone(), UtmZone::default());
}

#[test]
fn test_partial_file_configuration() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
utm_zone = 38
# Only the zone changes, everything else stays at its default
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.utm_zone.value, 38);
    assert_eq!(config.utm_zone.source, ConfigSource::File);
    assert_eq!(config.utm_hemisphere.source, ConfigSource::Default);
    assert_eq!(config.network.source, ConfigSource::Default);
}

#[test]
fn test_invalid_file_values_abort_loading() {
    for body in [
        "utm_zone = 61",
        "utm_hemisphere = \"east\"",
        "coincidence_tolerance_m = -1.0",
        "network = \"gas\"",
        "invalid toml content [[[",
    ] {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", body).unwrap();
        assert!(
            LayeredConfig::with_defaults().load_from_file(file.path()).is_err(),
            "{body}"
        );
    }
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let non_existent = temp_dir.path().join("does_not_exist.toml");

    assert!(LayeredConfig::with_defaults().load_from_file(&non_existent).is_err());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("INFRATRACK_UTM_ZONE", "38");
    env::set_var("INFRATRACK_NETWORK", "sewage");
    env::set_var("INFRATRACK_COINCIDENCE_TOLERANCE", "2.5");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "utm_zone = 36\nnetwork = \"water\"\nmax_segment_length_m = 1500").unwrap();

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.utm_zone.value, 38);
    assert_eq!(config.utm_zone.source, ConfigSource::Environment);
    assert_eq!(config.network.value, NetworkContext::Sewage);
    assert_eq!(config.coincidence_tolerance_m.value, 2.5);
    assert_eq!(config.max_segment_length_m.value, 1500.0);
    assert_eq!(config.max_segment_length_m.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_bad_environment_values_are_ignored() {
    clear_env();
    env::set_var("INFRATRACK_UTM_ZONE", "99");
    env::set_var("INFRATRACK_DEGENERATE_TOLERANCE", "tiny");
    env::set_var("INFRATRACK_UTM_HEMISPHERE", "south");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.utm_zone.value, 37);
    assert_eq!(config.utm_zone.source, ConfigSource::Default);
    assert_eq!(config.degenerate_tolerance_m.value, 0.1);
    assert_eq!(config.utm_hemisphere.value, Hemisphere::South);
    assert_eq!(config.utm_hemisphere.source, ConfigSource::Environment);

    clear_env();
}

#[test]
#[serial]
fn test_full_configuration_workflow() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("infratrack.toml");
    fs::write(
        &config_path,
        r#"
utm_zone = 36
utm_hemisphere = "north"
degenerate_tolerance_m = 0.05
network = "water"
"#,
    )
    .unwrap();
    env::set_var("INFRATRACK_NETWORK", "mixed");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(&config_path)
        .unwrap()
        .load_from_env();

    assert_eq!(config.network.value, NetworkContext::Mixed);
    assert_eq!(config.network.source, ConfigSource::Environment);

    config.update_from_cli(CliConfigOverrides {
        network: Some(NetworkContext::Sewage),
        utm_zone: Some(37),
        ..Default::default()
    });

    assert_eq!(config.network.value, NetworkContext::Sewage);
    assert_eq!(config.network.source, ConfigSource::Cli);
    assert_eq!(config.degenerate_tolerance_m.value, 0.05);
    assert_eq!(config.degenerate_tolerance_m.source, ConfigSource::File);

    let ctx = ImportContext::from_config(&config);
    assert_eq!(ctx.network, NetworkContext::Sewage);
    assert_eq!(ctx.zone.number, 37);

    let inspection = config.to_inspection_map();
    assert_eq!(inspection.len(), 6);
    assert_eq!(inspection["degenerate_tolerance_m"], ("0.05 m".to_string(), ConfigSource::File));
    assert_eq!(inspection["network"], ("SEWAGE".to_string(), ConfigSource::Cli));

    assert!(ConfigSource::Cli.precedence() > ConfigSource::Environment.precedence());
    assert!(ConfigSource::Environment.precedence() > ConfigSource::File.precedence());
    assert!(ConfigSource::File.precedence() > ConfigSource::Default.precedence());

    clear_env();
}
