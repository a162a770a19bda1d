//! Configuration resolution tests
//!
//! Covers:
//! - Missing config files degrade to compiled defaults
//! - Explicit config paths must exist and parse
//! - Environment variables take priority over TOML values
//! - The API key is only ever read from environment or TOML
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Every test that touches SOPHONO_* variables is marked #[serial].

use serial_test::serial;
use sophono_common::config::{
    load_config, resolve_api_key, resolve_config_path, CollaboratorConfig, TomlConfig,
    API_KEY_ENV_VAR, BASE_URL_ENV_VAR, CONFIG_ENV_VAR, MODEL_ENV_VAR,
};
use sophono_common::Error;
use std::env;
use std::fs;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(API_KEY_ENV_VAR);
    env::remove_var(BASE_URL_ENV_VAR);
    env::remove_var(MODEL_ENV_VAR);
}

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_cli_path_wins_over_env_path() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let cli_path = dir.path().join("cli.toml");
    env::set_var(CONFIG_ENV_VAR, "/tmp/sophono-env.toml");

    let resolved = resolve_config_path(Some(&cli_path));
    assert_eq!(resolved, Some(cli_path));

    clear_env();
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/sophono-env.toml");

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(std::path::PathBuf::from("/tmp/sophono-env.toml")));

    clear_env();
}

#[test]
#[serial]
fn test_load_config_reads_explicit_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        [server]
        bind_addr = "0.0.0.0:9000"

        [collaborator]
        model = "test-model"
        timeout_secs = 0

        [estimate]
        clamp_score = false
        "#,
    );

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
    assert_eq!(config.collaborator.model, "test-model");
    assert_eq!(config.collaborator.timeout_secs, 0);
    assert!(!config.estimate.clamp_score);
    // Untouched sections keep compiled defaults
    assert_eq!(config.estimate.stream_ceiling, 100_000_000);
}

#[test]
#[serial]
fn test_load_config_missing_explicit_file_is_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let result = load_config(Some(&missing));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_env_overrides_toml_collaborator_settings() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        [collaborator]
        base_url = "http://toml.invalid/v1"
        model = "toml-model"
        "#,
    );
    env::set_var(BASE_URL_ENV_VAR, "http://env.invalid/v1");
    env::set_var(MODEL_ENV_VAR, "env-model");

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.collaborator.base_url, "http://env.invalid/v1");
    assert_eq!(config.collaborator.model, "env-model");

    clear_env();
}

#[test]
#[serial]
fn test_blank_env_override_is_ignored() {
    clear_env();
    env::set_var(MODEL_ENV_VAR, "   ");

    let mut config = TomlConfig::default();
    config.apply_env_overrides();
    assert_eq!(config.collaborator.model, "llama3-70b-8192");

    clear_env();
}

#[test]
#[serial]
fn test_api_key_env_priority() {
    clear_env();
    env::set_var(API_KEY_ENV_VAR, "env-key");

    let collaborator = CollaboratorConfig {
        api_key: Some("toml-key".to_string()),
        ..CollaboratorConfig::default()
    };
    assert_eq!(resolve_api_key(&collaborator), Some("env-key".to_string()));

    clear_env();
}

#[test]
#[serial]
fn test_api_key_from_toml_when_env_unset() {
    clear_env();

    let collaborator = CollaboratorConfig {
        api_key: Some("toml-key".to_string()),
        ..CollaboratorConfig::default()
    };
    assert_eq!(resolve_api_key(&collaborator), Some("toml-key".to_string()));
}

#[test]
#[serial]
fn test_api_key_blank_values_rejected() {
    clear_env();
    env::set_var(API_KEY_ENV_VAR, "  ");

    let collaborator = CollaboratorConfig {
        api_key: Some(String::new()),
        ..CollaboratorConfig::default()
    };
    assert_eq!(resolve_api_key(&collaborator), None);

    clear_env();
}
