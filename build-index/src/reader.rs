use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use plist::Dictionary;
use plist::Value;
use tracing::debug;

use crate::config::IndexConfig;
use crate::entry::BuildEntry;
use crate::error::BuildIndexError;
use crate::error::Result;

const LOGS_KEY: &str = "logs";
const TITLE_KEY: &str = "title";
const SCHEME_KEY: &str = "schemeIdentifier-schemeName";
const STARTED_KEY: &str = "timeStartedRecording";
const STOPPED_KEY: &str = "timeStoppedRecording";
const STABLE_READ_ATTEMPTS: usize = 3;

/// Resolves the latest recorded invocation from a cache tree's manifest.
#[derive(Debug, Clone, Default)]
pub struct BuildIndexReader {
    config: IndexConfig,
}

impl BuildIndexReader {
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Log folder of a cache tree.
    pub fn log_folder(&self, cache_tree: &Path) -> PathBuf {
        cache_tree.join(&self.config.log_subdir)
    }

    /// Manifest path inside a log folder.
    pub fn manifest_path(&self, log_folder: &Path) -> PathBuf {
        log_folder.join(&self.config.manifest_name)
    }

    /// Reads the newest entry of the cache tree rooted at `cache_tree`.
    pub fn read(&self, cache_tree: &Path) -> Option<BuildEntry> {
        self.read_log_folder(&self.log_folder(cache_tree))
    }

    /// Reads the newest entry of the manifest inside `log_folder`.
    ///
    /// A missing or unreadable manifest, or one without any timed record, is
    /// the normal state before the first build and yields `None`.
    pub fn read_log_folder(&self, log_folder: &Path) -> Option<BuildEntry> {
        let manifest = self.manifest_path(log_folder);
        match self.read_manifest(&manifest) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(path = %manifest.display(), "manifest not readable: {err}");
                None
            }
        }
    }

    /// Strict variant of [`Self::read_log_folder`] that surfaces why a
    /// manifest could not be resolved.
    pub fn read_manifest(&self, manifest: &Path) -> Result<Option<BuildEntry>> {
        let (root, modification_date) =
            read_stable(manifest, |path| Ok(Value::from_file(path)?))?;
        let logs = root
            .as_dictionary()
            .and_then(|dict| dict.get(LOGS_KEY))
            .and_then(Value::as_dictionary)
            .ok_or_else(|| BuildIndexError::MissingLogs(manifest.to_path_buf()))?;

        let Some((key, record, time_stopped)) = latest_record(logs) else {
            return Ok(None);
        };

        let title = string_field(record, TITLE_KEY).ok_or_else(|| BuildIndexError::MissingField {
            key: key.to_string(),
            field: TITLE_KEY,
        })?;
        let scheme_name =
            string_field(record, SCHEME_KEY).ok_or_else(|| BuildIndexError::MissingField {
                key: key.to_string(),
                field: SCHEME_KEY,
            })?;

        Ok(Some(BuildEntry {
            index_path: manifest.to_path_buf(),
            modification_date,
            entry_key: key.to_string(),
            is_build_type: self.config.is_build_title(&title),
            scheme_name,
            title,
            time_started: record.get(STARTED_KEY).and_then(number),
            time_stopped,
            log_extension: self.config.log_extension.clone(),
        }))
    }
}

/// Parses `manifest` and pairs the result with the modification time its
/// content belongs to. A manifest rewritten during the parse is read again.
fn read_stable<T>(
    manifest: &Path,
    mut parse: impl FnMut(&Path) -> Result<T>,
) -> Result<(T, SystemTime)> {
    let mut before = fs::metadata(manifest)?.modified()?;
    for _ in 0..STABLE_READ_ATTEMPTS {
        let parsed = parse(manifest)?;
        let after = fs::metadata(manifest)?.modified()?;
        if after == before {
            return Ok((parsed, after));
        }
        debug!(path = %manifest.display(), "manifest changed while reading");
        before = after;
    }
    Err(BuildIndexError::Unstable(manifest.to_path_buf()))
}

/// Picks the record with the greatest stop time. Ties go to the greatest key
/// so identical manifests always resolve to the same record.
fn latest_record(logs: &Dictionary) -> Option<(&str, &Dictionary, f64)> {
    logs.iter()
        .filter_map(|(key, value)| {
            let record = value.as_dictionary()?;
            let stopped = record.get(STOPPED_KEY).and_then(number)?;
            Some((key.as_str(), record, stopped))
        })
        .max_by(|(key_a, _, time_a), (key_b, _, time_b)| {
            match time_a.total_cmp(time_b) {
                Ordering::Equal => key_a.cmp(key_b),
                other => other,
            }
        })
}

fn string_field(record: &Dictionary, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_string).map(str::to_string)
}

fn number(value: &Value) -> Option<f64> {
    value
        .as_real()
        .or_else(|| value.as_signed_integer().map(|v| v as f64))
        .or_else(|| value.as_unsigned_integer().map(|v| v as f64))
}
