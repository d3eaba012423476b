use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::VerbosityLevel;
use crate::schema::SchemaKind;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Library configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub validation: ValidationConfig,
    pub schema: SchemaConfig,
    pub output: OutputConfig,
}

/// How validation events are treated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ValidationConfig {
    /// Which events are printed to stderr
    pub output_level: VerbosityLevel,
    /// Fail an operation on any validation event
    pub strict: bool,
}

/// Schema resources and compilation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchemaConfig {
    /// Directory containing `META-INF/schema/`
    pub resource_root: PathBuf,
    /// Maximum number of compiled schemas kept in memory
    pub cache_capacity: u64,
    /// Root schema file per root element name, replacing the built-in mapping
    pub catalog: BTreeMap<String, String>,
    /// Canonical `version` per root element name, replacing the built-in value
    pub versions: BTreeMap<String, String>,
}

/// Marshalling output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Indent nested elements
    pub formatted: bool,
    /// Spaces per indentation level
    pub indent: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            resource_root: dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("jee-descriptor"),
            cache_capacity: 16,
            catalog: BTreeMap::new(),
            versions: BTreeMap::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formatted: true,
            indent: 4,
        }
    }
}

impl OutputConfig {
    /// Indentation handed to the document writer, `None` for compact output
    pub fn effective_indent(&self) -> Option<usize> {
        (self.formatted && self.indent > 0).then_some(self.indent)
    }
}

const CONFIG_NAMES: [&str; 4] = [
    "jee-descriptor.toml",
    "jee-descriptor.json",
    ".jee-descriptor.toml",
    ".jee-descriptor.json",
];

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment
    pub async fn load_config(config_path: Option<&Path>) -> Result<Config> {
        let mut config = Config::default();

        let file_config = match config_path {
            Some(path) => Some(Self::load_from_file(path).await?),
            None => Self::find_config_file().await?,
        };
        if let Some(file_config) = file_config {
            config = Self::merge_configs(config, file_config);
        }

        config = Self::apply_environment_overrides(config)?;

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in the working directory, then the user config directory
    pub async fn find_config_file() -> Result<Option<Config>> {
        for name in &CONFIG_NAMES {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("jee-descriptor");
            for name in &CONFIG_NAMES {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(level) = env.get("JEE_DESCRIPTOR_OUTPUT_LEVEL") {
            config.validation.output_level = level.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid JEE_DESCRIPTOR_OUTPUT_LEVEL value: {}",
                    level
                ))
            })?;
        }

        if let Some(strict) = env.get("JEE_DESCRIPTOR_STRICT") {
            config.validation.strict = strict.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid JEE_DESCRIPTOR_STRICT value: {}", strict))
            })?;
        }

        if let Some(root) = env.get("JEE_DESCRIPTOR_SCHEMA_ROOT") {
            config.schema.resource_root = PathBuf::from(root);
        }

        if let Some(capacity) = env.get("JEE_DESCRIPTOR_SCHEMA_CACHE_CAPACITY") {
            config.schema.cache_capacity = capacity.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid JEE_DESCRIPTOR_SCHEMA_CACHE_CAPACITY value: {}",
                    capacity
                ))
            })?;
        }

        if let Some(formatted) = env.get("JEE_DESCRIPTOR_FORMATTED_OUTPUT") {
            config.output.formatted = formatted.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid JEE_DESCRIPTOR_FORMATTED_OUTPUT value: {}",
                    formatted
                ))
            })?;
        }

        if let Some(indent) = env.get("JEE_DESCRIPTOR_INDENT") {
            config.output.indent = indent.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid JEE_DESCRIPTOR_INDENT value: {}", indent))
            })?;
        }

        Ok(config)
    }

    /// Merge two configurations; map entries of the second extend the first
    pub fn merge_configs(mut base: Config, override_config: Config) -> Config {
        base.validation = override_config.validation;

        base.schema.resource_root = override_config.schema.resource_root;
        base.schema.cache_capacity = override_config.schema.cache_capacity;
        base.schema.catalog.extend(override_config.schema.catalog);
        base.schema.versions.extend(override_config.schema.versions);

        base.output = override_config.output;

        base
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.schema.cache_capacity == 0 {
            return Err(ConfigError::Validation(
                "Schema cache capacity must be greater than 0".to_string(),
            ));
        }

        if config.output.indent > 16 {
            return Err(ConfigError::Validation(
                "Indent cannot exceed 16 spaces".to_string(),
            ));
        }

        for (root, version) in &config.schema.versions {
            if SchemaKind::from_root_element(root).is_none() {
                return Err(ConfigError::Validation(format!(
                    "Version override for unsupported root element: {}",
                    root
                )));
            }
            if version.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Version override for {} is empty",
                    root
                )));
            }
        }

        for (root, file_name) in &config.schema.catalog {
            if SchemaKind::from_root_element(root).is_none() {
                return Err(ConfigError::Validation(format!(
                    "Schema override for unsupported root element: {}",
                    root
                )));
            }
            if !file_name.ends_with(".xsd") {
                return Err(ConfigError::Validation(format!(
                    "Schema override for {} is not an .xsd file: {}",
                    root, file_name
                )));
            }
        }

        Ok(())
    }
}
