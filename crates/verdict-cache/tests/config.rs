mod common;

use std::env;
use std::fs;
use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;
use verdict_cache::prelude::*;
use verdict_cache::load_config_with_options;
use verdict_errors::prelude::codes;

const ENV_KEYS: &[&str] = &[
    "VERDICT_CACHE__MAX_SIZE",
    "VERDICT_CACHE__ENABLE_SINGLE_FLIGHT",
    "VERDICT_CACHE__REFRESH_TRIGGER_FRACTION",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn missing_file_yields_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let config = load_config(Some(&dir.path().join("absent.yaml"))).unwrap();
    assert_eq!(config, CacheConfig::default());
    assert_eq!(load_config(None).unwrap(), CacheConfig::default());
}

#[test]
#[serial]
fn yaml_file_overrides_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.yaml");
    fs::write(
        &path,
        "max_size: 500\ndefault_ttl_ms: 60000\nenable_background_refresh: true\n",
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.max_size, 500);
    assert_eq!(config.default_ttl(), Duration::from_secs(60));
    assert!(config.enable_background_refresh);
    assert_eq!(config.hot_threshold, 10);
}

#[test]
#[serial]
fn toml_and_json_files_are_understood() {
    clear_env();
    let dir = TempDir::new().unwrap();

    let toml_path = dir.path().join("cache.toml");
    fs::write(&toml_path, "hot_threshold = 3\nshard_count = 8\n").unwrap();
    let config = load_config(Some(&toml_path)).unwrap();
    assert_eq!(config.hot_threshold, 3);
    assert_eq!(config.shard_count, 8);

    let json_path = dir.path().join("cache.json");
    fs::write(&json_path, r#"{"worker_pool_size": 16}"#).unwrap();
    let config = load_config(Some(&json_path)).unwrap();
    assert_eq!(config.worker_pool_size, 16);
}

#[test]
#[serial]
fn environment_wins_over_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.yml");
    fs::write(&path, "max_size: 500\n").unwrap();

    env::set_var("VERDICT_CACHE__MAX_SIZE", "42");
    env::set_var("VERDICT_CACHE__ENABLE_SINGLE_FLIGHT", "true");
    let config = load_config(Some(&path));
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.max_size, 42);
    assert!(config.enable_single_flight);
}

#[test]
#[serial]
fn env_overlay_can_be_skipped() {
    clear_env();
    env::set_var("VERDICT_CACHE__MAX_SIZE", "42");
    let options = LoadOptions {
        include_env: false,
        ..LoadOptions::default()
    };
    let config = load_config_with_options(&options);
    clear_env();
    assert_eq!(config.unwrap().max_size, 10_000);
}

#[test]
#[serial]
fn invalid_values_are_rejected_after_merge() {
    clear_env();
    env::set_var("VERDICT_CACHE__REFRESH_TRIGGER_FRACTION", "1.5");
    let result = load_config(None);
    clear_env();

    let err = result.expect_err("fraction above 1 must fail");
    assert_eq!(err.into_inner().code, codes::CONFIG_INVALID);
}

#[test]
#[serial]
fn unknown_extension_and_unknown_field_fail() {
    clear_env();
    let dir = TempDir::new().unwrap();

    let ini = dir.path().join("cache.ini");
    fs::write(&ini, "max_size=1").unwrap();
    assert!(load_config(Some(&ini)).is_err());

    let typo = dir.path().join("cache.yaml");
    fs::write(&typo, "max_sise: 5\n").unwrap();
    assert!(load_config(Some(&typo)).is_err());
}

#[tokio::test]
#[serial]
async fn loaded_config_builds_a_cache() {
    clear_env();
    common::init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.yaml");
    fs::write(&path, "max_size: 1\n").unwrap();
    let config = load_config(Some(&path)).unwrap();

    let source = common::CountingSource::new();
    let cache = common::facade(config, &source, &common::policies()).await;
    cache.authorize(&common::read("User::a", "Document::1")).await.unwrap();
    cache.authorize(&common::read("User::b", "Document::1")).await.unwrap();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().evictions, 1);
}
