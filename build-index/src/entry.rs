use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

/// The most recent recorded invocation found in one manifest.
///
/// Two entries are equal when they were read from the same manifest with the
/// same modification time. Re-reading an unchanged manifest after it was
/// touched yields a distinct entry even if every field matches.
#[derive(Debug, Clone)]
pub struct BuildEntry {
    /// Path of the manifest this entry was read from
    pub index_path: PathBuf,

    /// Manifest modification time at the moment of the read
    pub modification_date: SystemTime,

    /// Record key; also the activity log file stem
    pub entry_key: String,

    pub scheme_name: String,

    pub title: String,

    /// Whether `title` carries one of the configured build prefixes
    pub is_build_type: bool,

    /// Recording start, in manifest time units (seconds)
    pub time_started: Option<f64>,

    /// Recording stop, in manifest time units (seconds)
    pub time_stopped: f64,

    /// Extension of the activity log file, without the dot
    pub log_extension: String,
}

impl BuildEntry {
    /// Folder holding both the manifest and the activity logs.
    pub fn folder(&self) -> &Path {
        self.index_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Compressed activity log recorded for this entry.
    pub fn log_path(&self) -> PathBuf {
        self.folder()
            .join(format!("{}.{}", self.entry_key, self.log_extension))
    }

    /// Whole seconds between recording start and stop.
    pub fn build_duration(&self) -> u64 {
        let Some(started) = self.time_started else {
            return 0;
        };
        let elapsed = self.time_stopped - started;
        if elapsed.is_finite() && elapsed > 0.0 {
            elapsed as u64
        } else {
            0
        }
    }
}

impl PartialEq for BuildEntry {
    fn eq(&self, other: &Self) -> bool {
        self.index_path == other.index_path && self.modification_date == other.modification_date
    }
}

impl Eq for BuildEntry {}

/// Renders a build duration the way the status line shows it: `42s`, `3m 5s`.
pub fn format_build_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds}s")
    } else {
        format!("{}m {}s", seconds / 60, seconds % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn entry(path: &str, modified: SystemTime) -> BuildEntry {
        BuildEntry {
            index_path: PathBuf::from(path),
            modification_date: modified,
            entry_key: "ABC-123".to_string(),
            scheme_name: "App".to_string(),
            title: "Build App".to_string(),
            is_build_type: true,
            time_started: Some(100.0),
            time_stopped: 165.5,
            log_extension: "xcactivitylog".to_string(),
        }
    }

    #[test]
    fn log_path_sits_next_to_manifest() {
        let entry = entry("/dd/App/Logs/Build/LogStoreManifest.plist", SystemTime::UNIX_EPOCH);
        assert_eq!(
            entry.log_path(),
            PathBuf::from("/dd/App/Logs/Build/ABC-123.xcactivitylog")
        );
    }

    #[test]
    fn equality_uses_path_and_modification_date() {
        let first = entry("/dd/a/LogStoreManifest.plist", SystemTime::UNIX_EPOCH);
        let mut same = first.clone();
        same.entry_key = "OTHER".to_string();
        assert_eq!(first, same);

        let touched = entry(
            "/dd/a/LogStoreManifest.plist",
            SystemTime::UNIX_EPOCH + Duration::from_secs(1),
        );
        assert_ne!(first, touched);

        let elsewhere = entry("/dd/b/LogStoreManifest.plist", SystemTime::UNIX_EPOCH);
        assert_ne!(first, elsewhere);
    }

    #[test]
    fn build_duration_saturates() {
        let mut entry = entry("/m.plist", SystemTime::UNIX_EPOCH);
        assert_eq!(entry.build_duration(), 65);

        entry.time_started = Some(200.0);
        assert_eq!(entry.build_duration(), 0);

        entry.time_started = None;
        assert_eq!(entry.build_duration(), 0);
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_build_duration(0), "0s");
        assert_eq!(format_build_duration(59), "59s");
        assert_eq!(format_build_duration(185), "3m 5s");
    }
}
