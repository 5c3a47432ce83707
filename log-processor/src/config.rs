use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

/// Tuning for a processing pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Interval between partial snapshots while a pass is scanning
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,

    /// Declaration markers stripped from the front of a symbol, in order
    #[serde(default = "default_symbol_prefixes")]
    pub symbol_prefixes: Vec<String>,
}

fn default_update_interval_ms() -> u64 {
    1_500
}

fn default_symbol_prefixes() -> Vec<String> {
    vec![
        "@objc ".to_string(),
        "final ".to_string(),
        "@IBAction ".to_string(),
    ]
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval_ms(),
            symbol_prefixes: default_symbol_prefixes(),
        }
    }
}

impl ProcessorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.update_interval_ms == 0 {
            return Err("Update interval must be > 0".to_string());
        }

        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }
}
