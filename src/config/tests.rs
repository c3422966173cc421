//! Configuration tests
//!
//! The round-trip tests guard `to_toml()`: every field written must parse
//! back to the same value, so a new field fails here until it is serialized.

use super::*;
use std::collections::HashMap;

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

fn parse(toml_str: &str) -> FileConfig {
    match toml::from_str(toml_str) {
        Ok(file) => file,
        Err(e) => panic!("Config should parse.\nTOML:\n{}\nError: {}", toml_str, e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_roundtrip_default() {
    let config = Config::default();
    let parsed = Config::resolve(parse(&config.to_toml()), no_env);
    assert_eq!(parsed, config);
}

#[test]
fn test_config_roundtrip_custom_values() {
    let mut config = Config::default();
    config.endpoint = "http://127.0.0.1:8080/hoa-ajax.php".to_string();
    config.timeout_secs = 30;
    config.search.debounce_ms = 350;
    config.scrape.limit = 25;
    config.scrape.save_dir = PathBuf::from(r#"C:\Users\pat\My "Exports""#);
    config.scrape.workers = 4;
    config.scrape.retries = 5;
    config.logging.level = "debug".to_string();
    config.logging.file_enabled = true;
    config.logging.file_rotation = LogRotation::Hourly;

    let parsed = Config::resolve(parse(&config.to_toml()), no_env);
    assert_eq!(parsed, config);
}

#[test]
fn test_demo_mode_is_not_persisted() {
    let config = Config {
        demo_mode: true,
        ..Config::default()
    };
    let parsed = Config::resolve(parse(&config.to_toml()), no_env);
    assert!(!parsed.demo_mode);
}

// ─────────────────────────────────────────────────────────────────────────────
// Precedence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_partial_file_falls_back_to_defaults() {
    let file = parse(
        r#"
endpoint = "http://localhost/hoa-ajax.php"

[scrape]
limit = 10
"#,
    );
    let config = Config::resolve(file, no_env);

    assert_eq!(config.endpoint, "http://localhost/hoa-ajax.php");
    assert_eq!(config.scrape.limit, 10);
    assert_eq!(config.scrape.workers, 20);
    assert_eq!(config.search.debounce_ms, 200);
    assert_eq!(config.return_url, "https://commerce.utah.gov/hoa/");
}

#[test]
fn test_env_overrides_file() {
    let file = parse(
        r#"
endpoint = "http://from-file/hoa-ajax.php"

[search]
debounce_ms = 500
"#,
    );
    let env = env_from(&[
        (ENV_ENDPOINT, "http://from-env/hoa-ajax.php"),
        (ENV_DEBOUNCE_MS, "50"),
        (ENV_DEMO, "true"),
    ]);
    let config = Config::resolve(file, env);

    assert_eq!(config.endpoint, "http://from-env/hoa-ajax.php");
    assert_eq!(config.search.debounce_ms, 50);
    assert!(config.demo_mode);
}

#[test]
fn test_unparseable_env_values_are_ignored() {
    let env = env_from(&[(ENV_DEBOUNCE_MS, "soon"), (ENV_DEMO, "nope")]);
    let config = Config::resolve(FileConfig::default(), env);

    assert_eq!(config.search.debounce_ms, 200);
    assert!(!config.demo_mode);
}

#[test]
fn test_non_positive_env_debounce_is_ignored() {
    for value in ["0", "-5"] {
        let env = env_from(&[(ENV_DEBOUNCE_MS, value)]);
        let config = Config::resolve(FileConfig::default(), env);
        assert_eq!(config.search.debounce_ms, 200, "override {:?}", value);
    }
}

#[test]
fn test_invalid_file_is_rejected() {
    let result: Result<FileConfig, _> = toml::from_str("timeout_secs = \"ten\"");
    assert!(result.is_err());
}

// ─────────────────────────────────────────────────────────────────────────────
// Component views
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_log_rotation_parsing() {
    assert_eq!(LogRotation::parse("HOURLY"), LogRotation::Hourly);
    assert_eq!(LogRotation::parse("never"), LogRotation::Never);
    assert_eq!(LogRotation::parse("weekly"), LogRotation::Daily);
}

#[test]
fn test_component_views() {
    let mut config = Config::default();
    config.search.debounce_ms = 300;
    config.scrape.retries = 0;

    assert_eq!(config.page_settings().search_delay, Duration::from_millis(300));
    assert_eq!(config.client_settings().timeout, Duration::from_secs(10));
    // At least one attempt is always made
    assert_eq!(config.scrape_options().retry.attempts, 1);
}
