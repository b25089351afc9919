//! Configuration loading and resolution
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable config file is never fatal; it is reported as a
//! warning and the remaining sources are used.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{Error, Result};

/// Environment variable pointing at the TOML config file
pub const CONFIG_PATH_ENV: &str = "CONCIERGE_CONFIG";

pub const ROOT_FOLDER_ENV: &str = "CONCIERGE_ROOT_FOLDER";
pub const BIND_ADDRESS_ENV: &str = "CONCIERGE_BIND_ADDRESS";
pub const PORT_ENV: &str = "CONCIERGE_PORT";
pub const LOG_LEVEL_ENV: &str = "CONCIERGE_LOG_LEVEL";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_MODEL_ENV: &str = "OPENAI_MODEL";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const QLOO_API_KEY_ENV: &str = "QLOO_API_KEY";
pub const QLOO_API_URL_ENV: &str = "QLOO_API_URL";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "concierge.db";

/// Built-in defaults used when no other source provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub qloo_base_url: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            bind_address: "127.0.0.1".to_string(),
            port: 3001,
            log_level: "info".to_string(),
            openai_model: "gpt-4.1".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            qloo_base_url: "https://api.qloo.com/v1".to_string(),
        }
    }
}

/// OS-dependent data folder (~/.local/share/concierge on Linux)
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("concierge"))
        .unwrap_or_else(|| PathBuf::from("./concierge_data"))
}

/// `[openai]` section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpenAiSection {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// `[qloo]` section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QlooSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Contents of the TOML config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub openai: OpenAiSection,
    pub qloo: QlooSection,
    /// Why the file on disk was ignored, if it was
    #[serde(skip)]
    pub load_warning: Option<String>,
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load the config file if one is found, otherwise defaults
    ///
    /// Parse and read failures fall back to defaults and are kept in
    /// `load_warning`, since this runs before logging is set up.
    pub fn load_or_default(cli_path: Option<&Path>) -> Self {
        let Some(path) = locate_config_file(cli_path) else {
            debug!("No config file found, using defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                debug!("Loaded config file: {}", path.display());
                config
            }
            Err(e) => Self {
                load_warning: Some(format!("Ignoring config file {}: {}", path.display(), e)),
                ..Self::default()
            },
        }
    }
}

/// Find the config file: explicit path, then `CONCIERGE_CONFIG`, then
/// `<config dir>/concierge/config.toml` if it exists
pub fn locate_config_file(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_value(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|d| d.join("concierge").join("config.toml"))
        .filter(|path| path.exists())
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub openai_model: Option<String>,
}

/// Credentials and endpoint of the language model API
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

/// Credentials and endpoint of the taste graph API
#[derive(Debug, Clone)]
pub struct QlooSettings {
    pub api_key: Option<String>,
    pub base_url: String,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
    pub openai: OpenAiSettings,
    pub qloo: QlooSettings,
    /// Problems found while resolving; logged once tracing is initialized
    pub warnings: Vec<String>,
}

impl ServiceConfig {
    /// Resolve every setting from CLI, environment, TOML and defaults
    pub fn resolve(cli: &ConfigOverrides, toml: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        let mut warnings: Vec<String> = toml.load_warning.iter().cloned().collect();

        let env_port = env_value(PORT_ENV).and_then(|raw| match raw.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                warnings.push(format!("Ignoring {}={:?}: not a valid port", PORT_ENV, raw));
                None
            }
        });

        Self {
            root_folder: first_of(
                cli.root_folder.clone(),
                env_value(ROOT_FOLDER_ENV).map(PathBuf::from),
                toml.root_folder.clone(),
            )
            .unwrap_or(defaults.root_folder),
            bind_address: first_of(
                cli.bind_address.clone(),
                env_value(BIND_ADDRESS_ENV),
                toml.bind_address.clone(),
            )
            .unwrap_or(defaults.bind_address),
            port: first_of(cli.port, env_port, toml.port).unwrap_or(defaults.port),
            log_level: first_of(
                cli.log_level.clone(),
                env_value(LOG_LEVEL_ENV),
                toml.log_level.clone(),
            )
            .unwrap_or(defaults.log_level),
            openai: OpenAiSettings {
                api_key: first_of(None, env_value(OPENAI_API_KEY_ENV), toml.openai.api_key.clone()),
                model: first_of(
                    cli.openai_model.clone(),
                    env_value(OPENAI_MODEL_ENV),
                    toml.openai.model.clone(),
                )
                .unwrap_or(defaults.openai_model),
                base_url: first_of(None, env_value(OPENAI_BASE_URL_ENV), toml.openai.base_url.clone())
                    .unwrap_or(defaults.openai_base_url),
            },
            qloo: QlooSettings {
                api_key: first_of(None, env_value(QLOO_API_KEY_ENV), toml.qloo.api_key.clone()),
                base_url: first_of(None, env_value(QLOO_API_URL_ENV), toml.qloo.base_url.clone())
                    .unwrap_or(defaults.qloo_base_url),
            },
            warnings,
        }
    }

    /// `host:port` to bind the HTTP listener to
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn first_of<T>(cli: Option<T>, env: Option<T>, toml: Option<T>) -> Option<T> {
    cli.or(env).or(toml)
}

/// Non-empty environment variable value
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Creates the root folder and locates the database inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder (and parents) if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            debug!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::parse(
            r#"
            root_folder = "/srv/concierge"
            port = 8080
            log_level = "debug"

            [openai]
            api_key = "sk-test"
            model = "gpt-4o"

            [qloo]
            base_url = "https://qloo.example/v1"
            "#,
        )
        .unwrap();

        assert_eq!(config.root_folder, Some(PathBuf::from("/srv/concierge")));
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai.model.as_deref(), Some("gpt-4o"));
        assert!(config.qloo.api_key.is_none());
        assert_eq!(config.qloo.base_url.as_deref(), Some("https://qloo.example/v1"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = TomlConfig::parse("").unwrap();
        assert!(config.root_folder.is_none());
        assert!(config.openai.api_key.is_none());
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        let err = TomlConfig::parse("port = \"eighty\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_first_of_priority() {
        assert_eq!(first_of(Some(1), Some(2), Some(3)), Some(1));
        assert_eq!(first_of(None, Some(2), Some(3)), Some(2));
        assert_eq!(first_of(None, None, Some(3)), Some(3));
        assert_eq!(first_of::<u8>(None, None, None), None);
    }

    #[test]
    fn test_database_path_in_root_folder() {
        let initializer = RootFolderInitializer::new(PathBuf::from("/tmp/concierge-root"));
        assert_eq!(initializer.database_path(), PathBuf::from("/tmp/concierge-root/concierge.db"));
    }
}
