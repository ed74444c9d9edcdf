//! Configuration structs with defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name used inside the config directory.
pub const CONFIG_FILE_NAME: &str = "mcstructure.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Structure encode/decode settings.
    pub codec: CodecConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Settings applied when mapping structures to and from the tag tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CodecConfig {
    /// Reject `block_position_data` entries that lack a `block_entity_data`
    /// compound instead of skipping them.
    pub strict_block_position_data: bool,
    /// Largest cell count a decoded structure may declare.
    pub max_volume: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (e.g. "info", "mcstructure_voxel=debug").
    pub level: String,
    /// Write a JSON log file in debug builds.
    pub file_logging: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            strict_block_position_data: false,
            max_volume: 1 << 26,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
        }
    }
}

// --- Load / Save ---

impl Config {
    /// Platform config directory for mcstructure, if the platform has one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mcstructure"))
    }

    /// Reads and validates the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads `mcstructure.ron` from `config_dir`, writing the defaults there first
    /// if the file does not exist yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Self::load(&config_path);
        }

        let config = Config::default();
        config.save(config_dir)?;
        log::info!("Created default config at {}", config_path.display());
        Ok(config)
    }

    /// Writes `mcstructure.ron` into `config_dir`, creating the directory if needed.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let write_error = |source: std::io::Error| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_error)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path,
            source,
        })
    }

    /// Rejects settings that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.codec.max_volume == 0 {
            return Err(ConfigError::InvalidValue {
                field: "codec.max_volume",
                reason: "must allow at least one cell".to_string(),
            });
        }
        if usize::try_from(self.codec.max_volume).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "codec.max_volume",
                reason: format!("{} does not fit in memory on this target", self.codec.max_volume),
            });
        }
        Ok(())
    }
}
