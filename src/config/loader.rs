//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("not supported file extension {0:?}")]
    UnsupportedFormat(String),
}

/// Structural format of a config file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick the decoder for `path`. Extensions are matched case-sensitively.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some(other) => Err(ConfigError::UnsupportedFormat(format!(".{}", other))),
            None => Err(ConfigError::UnsupportedFormat(String::new())),
        }
    }
}

/// Load configuration from a JSON or YAML file and apply defaults.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config = parse_config(&content, ConfigFormat::from_path(path)?)?;
    config.apply_defaults();

    Ok(config)
}

/// Decode raw config bytes. Defaults are not applied.
pub fn parse_config(content: &[u8], format: ConfigFormat) -> Result<ProxyConfig, ConfigError> {
    let config = match format {
        ConfigFormat::Json => serde_json::from_slice(content)?,
        ConfigFormat::Yaml => serde_yaml::from_slice(content)?,
    };
    Ok(config)
}
