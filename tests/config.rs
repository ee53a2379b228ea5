use std::io::Write;
use std::path::PathBuf;
use surfwatch::cli::Cli;
use surfwatch::config::{AuthKind, Config, RegistryKind};
use tempfile::NamedTempFile;

fn load(toml_content: &str) -> anyhow::Result<Config> {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml_content).unwrap();

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    Config::load(&cli)
}

#[test]
fn test_load_full_valid_config() {
    let config = load(
        r#"
        log_level = "debug"
        concurrency = 2

        [[locations]]
        name = "Jeffreys Bay"
        latitude = -34.05
        longitude = 24.93

        [[locations]]
        name = "Durban North Beach"
        latitude = -29.85
        longitude = 31.04

        [conditions]
        min_wave_height = 1.2
        min_wave_period = 9.0
        daylight_start_hour = 6
        daylight_end_hour = 17
        required_consecutive_hours = 4

        [weather]
        base_url = "http://localhost:8080"
        timeout_ms = 2500

        [registry]
        kind = "Static"
        tokens = ["tok-1", "tok-2"]

        [auth]
        kind = "Static"
        access_token = "abc"

        [push]
        base_url = "http://localhost:9090"
        title = "Surf's up"

        [schedule]
        run_on_startup = false
        interval_seconds = 3600

        [server]
        listen_address = "127.0.0.1:8000"
        prometheus = false
    "#,
    )
    .unwrap();

    assert_eq!(config.log_level, "debug");
    assert_eq!(config.concurrency, 2);
    assert_eq!(config.locations.len(), 2);
    assert_eq!(config.locations[0].name, "Jeffreys Bay");
    assert_eq!(config.conditions.min_wave_height, 1.2);
    assert_eq!(config.conditions.daylight_start_hour, 6);
    assert_eq!(config.conditions.required_consecutive_hours, 4);
    assert_eq!(config.weather.timeout_ms, 2500);
    assert_eq!(config.registry.kind, RegistryKind::Static);
    assert_eq!(config.registry.tokens, vec!["tok-1", "tok-2"]);
    // Not in the file, so the default remains.
    assert_eq!(config.registry.token_field, "fcmToken");
    assert_eq!(config.auth.kind, AuthKind::Static);
    assert_eq!(config.auth.access_token.as_deref(), Some("abc"));
    assert_eq!(config.push.base_url, "http://localhost:9090");
    assert_eq!(config.push.title, "Surf's up");
    assert_eq!(config.push.project_id, "surfspot-884c9");
    assert_eq!(config.push.max_concurrent_sends, 10);
    assert!(!config.schedule.run_on_startup);
    assert_eq!(config.schedule.interval_seconds, Some(3600));
    assert_eq!(config.server.listen_address, "127.0.0.1:8000");
    assert!(!config.server.prometheus);
}

#[test]
fn test_load_default_values() {
    let config = load("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.locations.len(), 5);
}

#[test]
fn test_cli_overrides_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        log_level = "warn"
        [schedule]
        interval_seconds = 60
    "#
    )
    .unwrap();

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        log_level: Some("trace".to_string()),
        interval_seconds: Some(900),
        listen_address: Some("127.0.0.1:0".to_string()),
        ..Default::default()
    };
    let config = Config::load(&cli).unwrap();

    assert_eq!(config.log_level, "trace");
    assert_eq!(config.schedule.interval_seconds, Some(900));
    assert!(config.schedule.run_on_startup);
    assert_eq!(config.server.listen_address, "127.0.0.1:0");
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let cli = Cli {
        config: Some(PathBuf::from("/nonexistent/surfwatch.toml")),
        ..Default::default()
    };
    let config = Config::load(&cli).unwrap();
    assert_eq!(config.conditions, Config::default().conditions);
}

#[test]
fn test_invalid_value_type() {
    assert!(load(r#"concurrency = "four""#).is_err());
}

#[test]
fn test_invalid_thresholds_rejected() {
    let result = load(
        r#"
        [conditions]
        daylight_start_hour = 18
        daylight_end_hour = 8
    "#,
    );
    assert!(result.is_err());
}

#[test]
fn test_duplicate_locations_rejected() {
    let result = load(
        r#"
        [[locations]]
        name = "Strand"
        latitude = -34.12
        longitude = 18.82

        [[locations]]
        name = "Strand"
        latitude = -34.13
        longitude = 18.83
    "#,
    );
    assert!(result.is_err());
}

#[test]
fn test_location_missing_field_rejected() {
    let result = load(
        r#"
        [[locations]]
        name = "Nowhere"
    "#,
    );
    assert!(result.is_err());
}
