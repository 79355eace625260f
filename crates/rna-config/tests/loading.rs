//! Layering of defaults, config files and environment variables.

use std::fs;

use rna_config::{ConfigError, RnaConfig};
use serial_test::serial;
use tempfile::TempDir;

fn set_env(key: &str, value: &str) {
    // SAFETY: tests touching the environment run serially.
    unsafe { std::env::set_var(key, value) }
}

fn remove_env(key: &str) {
    // SAFETY: tests touching the environment run serially.
    unsafe { std::env::remove_var(key) }
}

#[test]
#[serial]
fn defaults_without_a_file() {
    let dir = TempDir::new().unwrap();
    let config = RnaConfig::load(dir.path(), None).unwrap();
    assert_eq!(config, RnaConfig::default());
}

#[test]
#[serial]
fn file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("rna.toml"),
        r#"
[dev]
port = 3000

[transform]
jsx_factory = "h"
jsx_module = "preact"

[transform.alias]
react = "preact/compat"
"#,
    )
    .unwrap();

    let config = RnaConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.dev.port, 3000);
    assert_eq!(config.dev.host, "127.0.0.1");
    assert_eq!(config.transform.jsx_module.as_deref(), Some("preact"));
    assert_eq!(
        config.transform.alias.get("react").map(String::as_str),
        Some("preact/compat")
    );
}

#[test]
#[serial]
fn package_json_field_is_read() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{ "name": "app", "rna": { "dev": { "host": "0.0.0.0" } } }"#,
    )
    .unwrap();

    let config = RnaConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.dev.host, "0.0.0.0");
}

#[test]
#[serial]
fn environment_overrides_the_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rna.toml"), "[dev]\nport = 3000\n").unwrap();

    set_env("RNA_DEV__PORT", "4321");
    let config = RnaConfig::load(dir.path(), None);
    remove_env("RNA_DEV__PORT");

    assert_eq!(config.unwrap().dev.port, 4321);
}

#[test]
#[serial]
fn explicit_path_must_exist() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("custom.toml");
    let err = RnaConfig::load(dir.path(), Some(&missing)).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(path) if path == missing));
}

#[test]
#[serial]
fn explicit_json_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rna.config.json");
    fs::write(&path, r#"{ "transform": { "jsx_export": "default" } }"#).unwrap();

    let config = RnaConfig::load(dir.path(), Some(&path)).unwrap();
    assert_eq!(config.transform.jsx_export, "default");
}

#[test]
#[serial]
fn invalid_values_are_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rna.toml"), "[dev]\nport = \"eighty\"\n").unwrap();

    let err = RnaConfig::load(dir.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}
