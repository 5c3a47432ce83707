use std::fs;
use std::path::Path;
use std::path::PathBuf;

use buildtime_build_index::IndexConfig;
use buildtime_log_processor::ProcessorConfig;
use buildtime_watch::WatchConfig;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::error::ConfigError;

const CONFIG_DIR_NAME: &str = "buildtime";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Everything a monitoring session can be tuned with.
///
/// Every table and field is optional in the TOML file:
///
/// ```toml
/// [watch]
/// root_dir = "/Volumes/Build/DerivedData"
/// debounce_ms = 200
///
/// [processor]
/// update_interval_ms = 1000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub processor: ProcessorConfig,
}

impl MonitorConfig {
    /// `<config_dir>/buildtime/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `explicit` when given, else the default file when it exists,
    /// else the built-in defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn with_root(mut self, root_dir: PathBuf) -> Self {
        self.watch.root_dir = root_dir;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.watch.validate().map_err(ConfigError::Invalid)?;
        self.index.validate().map_err(ConfigError::Invalid)?;
        self.processor.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}
