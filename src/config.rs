//! Daemon configuration
//!
//! Read from `<config dir>/button-input/config.toml`; every field is optional and
//! falls back to the defaults below (BCM 21, active low, space bar).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::button::{ButtonSettings, Polarity, PullMode, DEFAULT_DEBOUNCE_MS};
use crate::input::DEFAULT_DEVICE_NAME;

const CONFIG_DIR: &str = "button-input";
const CONFIG_FILE: &str = "config.toml";

/// Linux input key code of the space bar
pub const KEY_SPACE: u16 = 57;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ButtonConfig {
    /// BCM pin number
    pub pin: u8,
    pub polarity: Polarity,
    /// Defaults to the bias matching `polarity`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull: Option<PullMode>,
    pub key_code: u16,
    pub debounce_ms: u64,
    pub device_name: String,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            pin: 21,
            polarity: Polarity::ActiveLow,
            pull: None,
            key_code: KEY_SPACE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            device_name: DEFAULT_DEVICE_NAME.to_string(),
        }
    }
}

impl ButtonConfig {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    /// Loads `path`, or the default location when `None`. A missing file yields defaults.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        debug!("Loading config from {}", path.display());

        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        if !exists {
            warn!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn pull(&self) -> PullMode {
        self.pull.unwrap_or_else(|| self.polarity.default_pull())
    }

    pub fn settings(&self) -> ButtonSettings {
        ButtonSettings {
            polarity: self.polarity,
            debounce_ms: self.debounce_ms,
        }
    }
}
