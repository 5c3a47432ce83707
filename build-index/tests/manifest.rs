use std::fs;
use std::path::Path;

use buildtime_build_index::BuildIndexError;
use buildtime_build_index::BuildIndexReader;
use buildtime_build_index::IndexConfig;
use plist::Dictionary;
use plist::Value;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn record(title: &str, scheme: &str, started: f64, stopped: f64) -> Value {
    let mut dict = Dictionary::new();
    dict.insert("title".to_string(), Value::String(title.to_string()));
    dict.insert(
        "schemeIdentifier-schemeName".to_string(),
        Value::String(scheme.to_string()),
    );
    dict.insert("timeStartedRecording".to_string(), Value::Real(started));
    dict.insert("timeStoppedRecording".to_string(), Value::Real(stopped));
    Value::Dictionary(dict)
}

fn write_manifest(folder: &Path, records: Vec<(&str, Value)>) {
    fs::create_dir_all(folder).expect("create log folder");
    let mut logs = Dictionary::new();
    for (key, value) in records {
        logs.insert(key.to_string(), value);
    }
    let mut root = Dictionary::new();
    root.insert("logs".to_string(), Value::Dictionary(logs));
    Value::Dictionary(root)
        .to_file_xml(folder.join("LogStoreManifest.plist"))
        .expect("write manifest");
}

#[test]
fn reads_latest_entry_from_cache_tree() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let tree = temp_dir.path().join("App-abcdef");
    let folder = tree.join("Logs").join("Build");
    write_manifest(
        &folder,
        vec![
            ("OLD", record("Build App", "App", 100.0, 110.0)),
            ("NEW", record("Build App", "App", 200.0, 275.0)),
        ],
    );

    let reader = BuildIndexReader::new(IndexConfig::default());
    let entry = reader.read(&tree).expect("entry");

    assert_eq!(entry.entry_key, "NEW");
    assert_eq!(entry.scheme_name, "App");
    assert_eq!(entry.title, "Build App");
    assert!(entry.is_build_type);
    assert_eq!(entry.build_duration(), 75);
    assert_eq!(entry.index_path, folder.join("LogStoreManifest.plist"));
    assert_eq!(entry.log_path(), folder.join("NEW.xcactivitylog"));
}

#[test]
fn non_build_entries_are_still_returned() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let folder = temp_dir.path().join("Logs").join("Build");
    write_manifest(&folder, vec![("T", record("Test App", "App", 1.0, 2.0))]);

    let reader = BuildIndexReader::default();
    let entry = reader.read_log_folder(&folder).expect("entry");
    assert_eq!(entry.title, "Test App");
    assert!(!entry.is_build_type);
}

#[test]
fn missing_manifest_yields_none() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let reader = BuildIndexReader::default();
    assert!(reader.read(temp_dir.path()).is_none());
}

#[test]
fn manifest_without_timed_records_yields_none() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let folder = temp_dir.path().to_path_buf();
    let mut untimed = Dictionary::new();
    untimed.insert("title".to_string(), Value::String("Build App".to_string()));
    write_manifest(&folder, vec![("A", Value::Dictionary(untimed))]);

    let reader = BuildIndexReader::default();
    assert!(reader.read_log_folder(&folder).is_none());
}

#[test]
fn latest_entry_without_scheme_is_reported() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let folder = temp_dir.path().to_path_buf();
    let mut partial = Dictionary::new();
    partial.insert("title".to_string(), Value::String("Build App".to_string()));
    partial.insert("timeStoppedRecording".to_string(), Value::Real(9.0));
    write_manifest(&folder, vec![("A", Value::Dictionary(partial))]);

    let reader = BuildIndexReader::default();
    let manifest = reader.manifest_path(&folder);
    let err = reader.read_manifest(&manifest).expect_err("missing scheme");
    assert!(matches!(
        err,
        BuildIndexError::MissingField {
            field: "schemeIdentifier-schemeName",
            ..
        }
    ));
    assert!(reader.read_log_folder(&folder).is_none());
}

#[test]
fn garbage_manifest_yields_none() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let folder = temp_dir.path().to_path_buf();
    fs::write(folder.join("LogStoreManifest.plist"), b"not a plist").expect("write");

    let reader = BuildIndexReader::default();
    assert!(reader.read_log_folder(&folder).is_none());
}
