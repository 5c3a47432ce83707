use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;

use buildtime_core::BuildCompletion;
use buildtime_core::BuildMonitor;
use buildtime_core::ChannelEventSource;
use buildtime_core::MonitorConfig;
use buildtime_core::MonitorError;
use buildtime_core::MonitorEvent;
use buildtime_core::list_recent_entries;
use buildtime_log_processor::ProcessingState;
use flate2::Compression;
use flate2::write::GzEncoder;
use plist::Dictionary;
use plist::Value;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(15);
const LOG_TEXT: &str =
    "12.5ms\t/a/b.swift:3:4\tfoo()\r3.0ms\t/a/b.swift:3:4\tfoo()\r0.5ms\t/a/c.swift:1:1\tbar()\r";

fn log_folder(tree: &Path) -> PathBuf {
    tree.join("Logs").join("Build")
}

fn make_project(root: &Path, name: &str) -> PathBuf {
    let tree = root.join(name);
    fs::create_dir_all(log_folder(&tree)).expect("create log folder");
    tree
}

fn write_log(tree: &Path, key: &str, text: &str) {
    let path = log_folder(tree).join(format!("{key}.xcactivitylog"));
    let file = File::create(path).expect("create log");
    let mut encoder = GzEncoder::new(file, Compression::fast());
    encoder.write_all(text.as_bytes()).expect("write log");
    encoder.finish().expect("finish gzip");
}

fn write_manifest(tree: &Path, key: &str, title: &str) -> PathBuf {
    let mut record = Dictionary::new();
    record.insert("title".to_string(), Value::String(title.to_string()));
    record.insert(
        "schemeIdentifier-schemeName".to_string(),
        Value::String("App".to_string()),
    );
    record.insert("timeStartedRecording".to_string(), Value::Real(100.0));
    record.insert("timeStoppedRecording".to_string(), Value::Real(190.0));
    let mut logs = Dictionary::new();
    logs.insert(key.to_string(), Value::Dictionary(record));
    let mut root = Dictionary::new();
    root.insert("logs".to_string(), Value::Dictionary(logs));

    let path = log_folder(tree).join("LogStoreManifest.plist");
    Value::Dictionary(root)
        .to_file_xml(&path)
        .expect("write manifest");
    path
}

fn config(root: &Path) -> MonitorConfig {
    let mut config = MonitorConfig::default().with_root(root.to_path_buf());
    config.watch.debounce_ms = 50;
    config
}

fn large_log(lines: usize) -> String {
    (0..lines)
        .map(|i| {
            format!(
                "{}.5ms\t/src/File{}.swift:{}:1\tf{i}()\r",
                i % 40,
                i % 100,
                i % 60 + 1
            )
        })
        .collect()
}

async fn wait_for<F>(
    rx: &mut mpsc::UnboundedReceiver<MonitorEvent>,
    mut predicate: F,
) -> MonitorEvent
where
    F: FnMut(&MonitorEvent) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            let event = rx.recv().await.expect("monitor still running");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event within timeout")
}

fn is_final_snapshot(event: &MonitorEvent) -> bool {
    matches!(event, MonitorEvent::Snapshot(update) if update.completed)
}

fn started_key(event: &MonitorEvent) -> Option<&str> {
    match event {
        MonitorEvent::PassStarted(entry) => Some(entry.entry_key.as_str()),
        _ => None,
    }
}

async fn wait_until_watching_logs(rx: &mut mpsc::UnboundedReceiver<MonitorEvent>) {
    wait_for(rx, |event| {
        *event == MonitorEvent::State(ProcessingState::Watching { indicating: true })
    })
    .await;
}

#[tokio::test]
async fn detected_build_is_processed() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let tree = make_project(temp_dir.path(), "App-abcdef");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let monitor = BuildMonitor::start(config(temp_dir.path()), tx).expect("start monitor");
    wait_until_watching_logs(&mut rx).await;

    write_log(&tree, "KEY-1", LOG_TEXT);
    write_manifest(&tree, "KEY-1", "Build App");

    let started = wait_for(&mut rx, |event| started_key(event).is_some()).await;
    assert_eq!(started_key(&started), Some("KEY-1"));
    assert_eq!(
        wait_for(&mut rx, |event| matches!(event, MonitorEvent::State(_))).await,
        MonitorEvent::State(ProcessingState::Processing)
    );

    let MonitorEvent::Snapshot(update) = wait_for(&mut rx, is_final_snapshot).await else {
        unreachable!("filtered above");
    };
    assert!(!update.cancelled);
    let files: Vec<(&str, f64, usize)> = update
        .records
        .iter()
        .map(|r| (r.filename.as_str(), r.time, r.references))
        .collect();
    assert_eq!(files, vec![("b.swift", 15.5, 2), ("c.swift", 0.5, 1)]);

    let state = wait_for(&mut rx, |event| matches!(event, MonitorEvent::State(_))).await;
    let MonitorEvent::State(state) = state else {
        unreachable!("filtered above");
    };
    assert_eq!(state.label(), "Completed");

    monitor.stop().await;
}

#[tokio::test]
async fn build_completion_triggers_refresh() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let tree = make_project(temp_dir.path(), "App-abcdef");
    write_log(&tree, "KEY-7", LOG_TEXT);
    write_manifest(&tree, "KEY-7", "Build App");

    let (host, source) = ChannelEventSource::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let monitor =
        BuildMonitor::start_with_source(config(temp_dir.path()), Some(Box::new(source)), tx)
            .expect("start monitor");
    wait_until_watching_logs(&mut rx).await;

    let completion = BuildCompletion {
        name: "App".to_string(),
        succeeded: true,
        duration: Duration::from_secs(90),
    };
    host.send(completion.clone()).expect("send completion");

    assert_eq!(
        wait_for(&mut rx, |event| matches!(event, MonitorEvent::BuildCompleted(_))).await,
        MonitorEvent::BuildCompleted(completion)
    );
    let started = wait_for(&mut rx, |event| started_key(event).is_some()).await;
    assert_eq!(started_key(&started), Some("KEY-7"));
    wait_for(&mut rx, is_final_snapshot).await;

    monitor.stop().await;
}

#[tokio::test]
async fn manual_entries_run_one_after_another() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let first = make_project(temp_dir.path(), "First-aaaa");
    let second = make_project(temp_dir.path(), "Second-bbbb");
    write_log(&first, "FIRST", &large_log(150_000));
    write_manifest(&first, "FIRST", "Build First");
    write_log(&second, "SECOND", LOG_TEXT);
    write_manifest(&second, "SECOND", "Build Second");

    let config = config(temp_dir.path());
    let builds = list_recent_entries(temp_dir.path(), &config).expect("list builds");
    let entry = |key: &str| {
        builds
            .iter()
            .find(|build| build.entry.entry_key == key)
            .map(|build| build.entry.clone())
            .expect("listed entry")
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let monitor = BuildMonitor::start(config, tx).expect("start monitor");
    monitor.process_entry(entry("FIRST"));
    monitor.process_entry(entry("SECOND"));

    let mut order = Vec::new();
    while order.len() < 4 {
        let event = wait_for(&mut rx, |event| {
            started_key(event).is_some() || is_final_snapshot(event)
        })
        .await;
        order.push(match &event {
            MonitorEvent::PassStarted(entry) => format!("start {}", entry.entry_key),
            MonitorEvent::Snapshot(update) if update.cancelled => "cancelled".to_string(),
            _ => "done".to_string(),
        });
    }
    // The newer entry cancels the active pass before its scan reaches a record.
    assert_eq!(order, vec!["start FIRST", "cancelled", "start SECOND", "done"]);

    monitor.stop().await;
}

#[tokio::test]
async fn same_entry_is_ignored_while_its_pass_runs() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let tree = make_project(temp_dir.path(), "App-abcdef");
    write_log(&tree, "SAME", &large_log(150_000));
    write_manifest(&tree, "SAME", "Build App");

    let config = config(temp_dir.path());
    let entry = list_recent_entries(temp_dir.path(), &config)
        .expect("list builds")
        .remove(0)
        .entry;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let monitor = BuildMonitor::start(config, tx).expect("start monitor");
    monitor.process_entry(entry.clone());
    monitor.process_entry(entry);

    let started = wait_for(&mut rx, |event| started_key(event).is_some()).await;
    assert_eq!(started_key(&started), Some("SAME"));
    let MonitorEvent::Snapshot(update) = wait_for(&mut rx, is_final_snapshot).await else {
        unreachable!("filtered above");
    };
    assert!(!update.cancelled);
    assert!(!update.records.is_empty());

    let restarted = tokio::time::timeout(Duration::from_millis(500), async {
        loop {
            match rx.recv().await {
                Some(event) if started_key(&event).is_some() => return true,
                Some(_) => {}
                None => return false,
            }
        }
    })
    .await;
    assert!(!matches!(restarted, Ok(true)));

    monitor.stop().await;
}

#[tokio::test]
async fn cancel_reports_cancelled_pass() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let tree = make_project(temp_dir.path(), "App-abcdef");
    write_log(&tree, "BIG", &large_log(400_000));
    write_manifest(&tree, "BIG", "Build App");

    let config = config(temp_dir.path());
    let entry = list_recent_entries(temp_dir.path(), &config)
        .expect("list builds")
        .remove(0)
        .entry;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let monitor = BuildMonitor::start(config, tx).expect("start monitor");
    monitor.process_entry(entry);
    wait_for(&mut rx, |event| started_key(event).is_some()).await;
    monitor.cancel();

    let MonitorEvent::Snapshot(update) = wait_for(&mut rx, is_final_snapshot).await else {
        unreachable!("filtered above");
    };
    // The scan can beat the cancel request on a fast machine.
    if update.cancelled {
        assert_eq!(update.state().label(), "Cancelled");
    }

    monitor.stop().await;
}

#[tokio::test]
async fn listing_orders_by_manifest_date() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let older = make_project(temp_dir.path(), "Older-aaaa");
    let newer = make_project(temp_dir.path(), "Newer-bbbb");
    make_project(temp_dir.path(), "Empty-cccc");
    fs::create_dir_all(temp_dir.path().join("ModuleCache.noindex")).expect("create cache");

    let older_manifest = write_manifest(&older, "OLD", "Build Older");
    write_manifest(&newer, "NEW", "Test Newer");
    File::options()
        .write(true)
        .open(&older_manifest)
        .expect("open manifest")
        .set_modified(SystemTime::now() - Duration::from_secs(3_600))
        .expect("set mtime");

    let builds = list_recent_entries(temp_dir.path(), &MonitorConfig::default())
        .expect("list builds");
    let summary: Vec<(String, &str, bool)> = builds
        .iter()
        .map(|build| {
            (
                build.tree.name(),
                build.entry.entry_key.as_str(),
                build.entry.is_build_type,
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Newer-bbbb".to_string(), "NEW", false),
            ("Older-aaaa".to_string(), "OLD", true),
        ]
    );
    assert_eq!(builds[1].entry.build_duration(), 90);
}

#[tokio::test]
async fn start_fails_for_missing_root_or_bad_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (tx, _rx) = mpsc::unbounded_channel();
    let missing = BuildMonitor::start(config(&temp_dir.path().join("absent")), tx.clone());
    assert!(matches!(missing, Err(MonitorError::Watch(_))));

    let mut invalid = config(temp_dir.path());
    invalid.processor.update_interval_ms = 0;
    assert!(matches!(
        BuildMonitor::start(invalid, tx),
        Err(MonitorError::Config(_))
    ));
}
