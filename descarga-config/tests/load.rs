use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use descarga_config::{ClientConfig, ClientConfigSource, ConfigLoadError};
use tempfile::TempDir;

fn env_of(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn config_path_takes_precedence_over_inline_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("client.toml");
    fs::write(
        &path,
        "base_url = \"http://127.0.0.1:9000/v3\"\npoll_interval_ms = 250\n",
    )
    .unwrap();

    let (config, source) = ClientConfig::load_with(env_of(&[
        ("DESCARGA_CONFIG_PATH", path.display().to_string()),
        ("DESCARGA_CONFIG_JSON", r#"{"poll_interval_ms": 9}"#.to_string()),
    ]))
    .expect("config loads");

    assert_eq!(source, ClientConfigSource::EnvPath(path));
    assert_eq!(config.base_url, "http://127.0.0.1:9000/v3");
    assert_eq!(config.poll_interval(), Duration::from_millis(250));
}

#[test]
fn inline_json_and_overrides() {
    let (config, source) = ClientConfig::load_with(env_of(&[
        ("DESCARGA_CONFIG_JSON", r#"{"connect_timeout_ms": 1000}"#.to_string()),
        ("DESCARGA_BASE_URL", " http://localhost:1234/v3 ".to_string()),
        ("DESCARGA_POLL_INTERVAL", "2s".to_string()),
    ]))
    .expect("config loads");

    assert_eq!(source, ClientConfigSource::EnvInline);
    assert_eq!(config.connect_timeout(), Duration::from_secs(1));
    assert_eq!(config.base_url, "http://localhost:1234/v3");
    assert_eq!(config.poll_interval_ms, 2_000);
}

#[test]
fn bad_poll_interval_is_reported_with_its_variable() {
    let err = ClientConfig::load_with(env_of(&[(
        "DESCARGA_POLL_INTERVAL",
        "often".to_string(),
    )]))
    .unwrap_err();

    assert!(matches!(
        err,
        ConfigLoadError::InvalidDuration {
            var: "DESCARGA_POLL_INTERVAL",
            ..
        }
    ));
}

#[test]
fn missing_config_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = ClientConfig::load_with(env_of(&[(
        "DESCARGA_CONFIG_PATH",
        path.display().to_string(),
    )]))
    .unwrap_err();

    assert!(matches!(err, ConfigLoadError::ConfigFileIo { .. }));
}

#[test]
fn invalid_base_url_fails_validation() {
    let err = ClientConfig::load_with(env_of(&[(
        "DESCARGA_BASE_URL",
        "not a url".to_string(),
    )]))
    .unwrap_err();

    assert!(matches!(err, ConfigLoadError::InvalidBaseUrl { .. }));
}
