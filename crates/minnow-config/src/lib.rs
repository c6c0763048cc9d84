use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_MINNOW_CONFIG: &str = "MINNOW_CONFIG";

const DEFAULT_PACKAGE_MANAGER_BINARY: &str = "npm";
const DEFAULT_DEPENDENCY_CACHE_DIR: &str = "node_modules";
const DEFAULT_GLOBAL_EVENT_BUFFER: usize = 512;
const DEFAULT_PROJECT_EVENT_BUFFER: usize = 64;
const DEFAULT_STATUS_TEXT: &str = "Please wait...";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Message(String),
}

impl ConfigError {
    fn configuration(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MinnowConfig {
    #[serde(default)]
    pub package_manager: PackageManagerConfigToml,
    #[serde(default)]
    pub events: EventBusConfigToml,
    #[serde(default)]
    pub status: StatusConfigToml,
}

/// Settings for the package-manager service that owns subprocess invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageManagerConfigToml {
    #[serde(default = "default_package_manager_binary")]
    pub binary: String,
    #[serde(default)]
    pub extra_install_args: Vec<String>,
    #[serde(default = "default_dependency_cache_dir")]
    pub dependency_cache_dir: String,
}

impl Default for PackageManagerConfigToml {
    fn default() -> Self {
        Self {
            binary: default_package_manager_binary(),
            extra_install_args: Vec::new(),
            dependency_cache_dir: default_dependency_cache_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventBusConfigToml {
    #[serde(default = "default_global_event_buffer")]
    pub global_buffer: usize,
    #[serde(default = "default_project_event_buffer")]
    pub project_buffer: usize,
}

impl Default for EventBusConfigToml {
    fn default() -> Self {
        Self {
            global_buffer: default_global_event_buffer(),
            project_buffer: default_project_event_buffer(),
        }
    }
}

/// Loading-screen wording shown while a blocking action runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusConfigToml {
    #[serde(default = "default_status_text")]
    pub default_text: String,
}

impl Default for StatusConfigToml {
    fn default() -> Self {
        Self {
            default_text: default_status_text(),
        }
    }
}

fn default_status_text() -> String {
    DEFAULT_STATUS_TEXT.to_owned()
}

fn default_package_manager_binary() -> String {
    DEFAULT_PACKAGE_MANAGER_BINARY.to_owned()
}

fn default_dependency_cache_dir() -> String {
    DEFAULT_DEPENDENCY_CACHE_DIR.to_owned()
}

fn default_global_event_buffer() -> usize {
    DEFAULT_GLOBAL_EVENT_BUFFER
}

fn default_project_event_buffer() -> usize {
    DEFAULT_PROJECT_EVENT_BUFFER
}

impl MinnowConfig {
    /// Loads from the given path, or from `MINNOW_CONFIG` when unset, or
    /// falls back to defaults when neither names an existing file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved: Option<PathBuf> = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_MINNOW_CONFIG).map(PathBuf::from));

        let Some(config_path) = resolved else {
            return Ok(Self::default());
        };
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&config_path).map_err(|err| {
            ConfigError::configuration(format!(
                "failed to read config file {}: {err}",
                config_path.display()
            ))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)
            .map_err(|err| ConfigError::configuration(format!("invalid config file: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.package_manager.binary.is_empty() {
            return Err(ConfigError::configuration(
                "package_manager.binary must not be empty",
            ));
        }
        if self.events.global_buffer == 0 || self.events.project_buffer == 0 {
            return Err(ConfigError::configuration(
                "event buffer capacities must be greater than 0",
            ));
        }
        Ok(())
    }
}
