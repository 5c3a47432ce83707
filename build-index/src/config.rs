use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;

/// Where the manifest lives and how its records are classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Log folder location relative to a cache tree
    #[serde(default = "default_log_subdir")]
    pub log_subdir: PathBuf,

    /// File name of the manifest inside a log folder
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,

    /// Extension of the compressed activity log written per entry
    #[serde(default = "default_log_extension")]
    pub log_extension: String,

    /// Title prefixes that mark an entry as a build or compile invocation
    #[serde(default = "default_build_prefixes")]
    pub build_prefixes: Vec<String>,
}

fn default_log_subdir() -> PathBuf {
    PathBuf::from("Logs").join("Build")
}

fn default_manifest_name() -> String {
    "LogStoreManifest.plist".to_string()
}

fn default_log_extension() -> String {
    "xcactivitylog".to_string()
}

fn default_build_prefixes() -> Vec<String> {
    vec!["Build ".to_string(), "Compile ".to_string()]
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            log_subdir: default_log_subdir(),
            manifest_name: default_manifest_name(),
            log_extension: default_log_extension(),
            build_prefixes: default_build_prefixes(),
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.log_subdir.as_os_str().is_empty() {
            return Err("Log subdirectory must not be empty".to_string());
        }

        if self.manifest_name.trim().is_empty() {
            return Err("Manifest name must not be empty".to_string());
        }

        if self.log_extension.trim().is_empty() {
            return Err("Log extension must not be empty".to_string());
        }

        Ok(())
    }

    pub fn is_build_title(&self, title: &str) -> bool {
        self.build_prefixes
            .iter()
            .any(|prefix| title.starts_with(prefix.as_str()))
    }
}
