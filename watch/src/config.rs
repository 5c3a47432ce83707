use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Which directory to watch and how eagerly to react to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directory holding one cache tree per project
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Child directory names of the root that are never cache trees
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,

    /// Delay between a log folder event and reading its manifest (ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_root_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("~"))
        .join("Library")
        .join("Developer")
        .join("Xcode")
        .join("DerivedData")
}

fn default_excluded_dirs() -> Vec<String> {
    vec!["ModuleCache".to_string(), "ModuleCache.noindex".to_string()]
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            excluded_dirs: default_excluded_dirs(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl WatchConfig {
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.root_dir.as_os_str().is_empty() {
            return Err("Root directory must not be empty".to_string());
        }

        if self.debounce_ms == 0 {
            return Err("Debounce delay must be > 0".to_string());
        }

        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
