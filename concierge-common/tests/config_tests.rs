//! Unit tests for configuration resolution and graceful degradation
//!
//! Tests the priority order CLI > environment > TOML > compiled default and
//! that a missing or broken config file never stops startup.
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate CONCIERGE_* variables are marked with #[serial].

use concierge_common::config::{
    CompiledDefaults, ConfigOverrides, RootFolderInitializer, ServiceConfig, TomlConfig,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

const MANAGED_VARS: [&str; 9] = [
    "CONCIERGE_CONFIG",
    "CONCIERGE_ROOT_FOLDER",
    "CONCIERGE_BIND_ADDRESS",
    "CONCIERGE_PORT",
    "CONCIERGE_LOG_LEVEL",
    "OPENAI_API_KEY",
    "OPENAI_MODEL",
    "QLOO_API_KEY",
    "QLOO_API_URL",
];

fn clear_env() {
    for var in MANAGED_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_when_nothing_configured() {
    clear_env();

    let config = ServiceConfig::resolve(&ConfigOverrides::default(), &TomlConfig::default());
    let defaults = CompiledDefaults::for_current_platform();

    assert_eq!(config.root_folder, defaults.root_folder);
    assert_eq!(config.port, 3001);
    assert_eq!(config.log_level, "info");
    assert_eq!(config.openai.model, "gpt-4.1");
    assert!(config.openai.api_key.is_none());
    assert!(config.qloo.api_key.is_none());
    assert_eq!(config.qloo.base_url, "https://api.qloo.com/v1");
    assert_eq!(config.listen_address(), "127.0.0.1:3001");
}

#[test]
#[serial]
fn test_toml_overrides_defaults() {
    clear_env();

    let toml = TomlConfig::parse(
        r#"
        port = 9000
        [qloo]
        api_key = "qloo-from-toml"
        "#,
    )
    .unwrap();
    let config = ServiceConfig::resolve(&ConfigOverrides::default(), &toml);

    assert_eq!(config.port, 9000);
    assert_eq!(config.qloo.api_key.as_deref(), Some("qloo-from-toml"));
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    env::set_var("CONCIERGE_PORT", "9100");
    env::set_var("QLOO_API_KEY", "qloo-from-env");

    let toml = TomlConfig::parse("port = 9000\n[qloo]\napi_key = \"qloo-from-toml\"\n").unwrap();
    let config = ServiceConfig::resolve(&ConfigOverrides::default(), &toml);

    assert_eq!(config.port, 9100);
    assert_eq!(config.qloo.api_key.as_deref(), Some("qloo-from-env"));

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    env::set_var("CONCIERGE_PORT", "9100");
    env::set_var("CONCIERGE_ROOT_FOLDER", "/tmp/concierge-env-root");

    let cli = ConfigOverrides {
        port: Some(9200),
        root_folder: Some(PathBuf::from("/tmp/concierge-cli-root")),
        ..Default::default()
    };
    let config = ServiceConfig::resolve(&cli, &TomlConfig::default());

    assert_eq!(config.port, 9200);
    assert_eq!(config.root_folder, PathBuf::from("/tmp/concierge-cli-root"));

    clear_env();
}

#[test]
#[serial]
fn test_invalid_env_port_falls_through() {
    clear_env();
    env::set_var("CONCIERGE_PORT", "not-a-port");

    let toml = TomlConfig::parse("port = 9000").unwrap();
    let config = ServiceConfig::resolve(&ConfigOverrides::default(), &toml);
    assert_eq!(config.port, 9000);
    assert_eq!(config.warnings.len(), 1);
    assert!(config.warnings[0].contains("CONCIERGE_PORT"));

    clear_env();
}

#[test]
#[serial]
fn test_empty_env_value_is_ignored() {
    clear_env();
    env::set_var("OPENAI_API_KEY", "  ");

    let config = ServiceConfig::resolve(&ConfigOverrides::default(), &TomlConfig::default());
    assert!(config.openai.api_key.is_none());

    clear_env();
}

#[test]
#[serial]
fn test_load_or_default_reads_explicit_file() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "log_level = \"debug\"\n[openai]\nmodel = \"gpt-4o\"").unwrap();

    let toml = TomlConfig::load_or_default(Some(file.path()));
    assert_eq!(toml.log_level.as_deref(), Some("debug"));
    assert_eq!(toml.openai.model.as_deref(), Some("gpt-4o"));
}

#[test]
#[serial]
fn test_load_or_default_uses_env_path() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = 7000").unwrap();
    env::set_var("CONCIERGE_CONFIG", file.path());

    let toml = TomlConfig::load_or_default(None);
    assert_eq!(toml.port, Some(7000));

    clear_env();
}

#[test]
#[serial]
fn test_broken_or_missing_file_degrades_to_defaults() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = [this is not toml").unwrap();

    let broken = TomlConfig::load_or_default(Some(file.path()));
    assert!(broken.port.is_none());

    let missing = TomlConfig::load_or_default(Some(&PathBuf::from("/nonexistent/concierge.toml")));
    assert!(missing.port.is_none());
    assert!(missing.load_warning.is_some());

    // The warning survives resolution so it can be logged after tracing starts
    let config = ServiceConfig::resolve(&ConfigOverrides::default(), &broken);
    assert_eq!(config.warnings.len(), 1);
    assert!(config.warnings[0].starts_with("Ignoring config file"));
}

#[test]
#[serial]
fn test_clean_configuration_has_no_warnings() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = 7100").unwrap();

    let toml = TomlConfig::load_or_default(Some(file.path()));
    assert!(toml.load_warning.is_none());

    let config = ServiceConfig::resolve(&ConfigOverrides::default(), &toml);
    assert!(config.warnings.is_empty());
}

#[test]
fn test_initializer_creates_nested_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("a").join("b");
    let initializer = RootFolderInitializer::new(root.clone());

    initializer.ensure_directory_exists().unwrap();
    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("concierge.db"));

    // Second call is a no-op
    initializer.ensure_directory_exists().unwrap();
}
