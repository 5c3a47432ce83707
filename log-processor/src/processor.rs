use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use buildtime_build_index::BuildEntry;
use tokio::task::JoinHandle;
use tokio::task::spawn_blocking;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio::time::interval_at;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::ProcessorConfig;
use crate::log_file::read_log_text;
use crate::measure::MeasurementRecord;
use crate::ranking::into_records;
use crate::ranking::select_samples;
use crate::sample::SampleMap;
use crate::scanner::ScanStats;
use crate::scanner::scan_text;
use crate::state::ProcessingState;

/// One snapshot delivered to the consumer of a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessUpdate {
    /// Ranked, display-ready records (possibly empty)
    pub records: Vec<MeasurementRecord>,
    /// Set exactly once per pass, on the last update
    pub completed: bool,
    /// Only meaningful when `completed` is set
    pub cancelled: bool,
}

impl ProcessUpdate {
    fn partial(records: Vec<MeasurementRecord>) -> Self {
        Self {
            records,
            completed: false,
            cancelled: false,
        }
    }

    fn finished(records: Vec<MeasurementRecord>, cancelled: bool) -> Self {
        Self {
            records,
            completed: true,
            cancelled,
        }
    }

    /// State a consumer should show after receiving this update.
    pub fn state(&self) -> ProcessingState {
        if self.completed {
            ProcessingState::completed(self.records.len(), self.cancelled)
        } else {
            ProcessingState::Processing
        }
    }
}

/// Callback invoked for every snapshot of a pass, always from the pass task,
/// so updates of one pass never overlap.
pub type UpdateCallback = Arc<dyn Fn(ProcessUpdate) + Send + Sync>;

/// Runs processing passes over activity logs.
///
/// Only one pass should be in flight per processor; admission is up to the
/// caller (see `PassScheduler` in `buildtime-core`).
#[derive(Debug, Clone)]
pub struct LogProcessor {
    config: Arc<ProcessorConfig>,
    should_cancel: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
}

impl LogProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            config: Arc::new(config),
            should_cancel: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Asks the active pass to stop at the next record boundary.
    pub fn cancel(&self) {
        self.should_cancel.store(true, Ordering::Release);
    }

    pub fn is_processing(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Starts a pass over the activity log belonging to `entry`.
    pub fn process(&self, entry: &BuildEntry, on_update: UpdateCallback) -> JoinHandle<()> {
        self.process_log_file(entry.log_path(), on_update)
    }

    /// Starts a pass over an arbitrary gzip-compressed activity log.
    ///
    /// A cancel request left over from an earlier pass is discarded here;
    /// `cancel` calls made after this returns apply to the new pass.
    pub fn process_log_file(&self, path: PathBuf, on_update: UpdateCallback) -> JoinHandle<()> {
        self.should_cancel.store(false, Ordering::Release);
        self.active.store(true, Ordering::Release);
        let this = self.clone();
        tokio::spawn(async move { this.run_pass(path, on_update).await })
    }

    async fn run_pass(self, path: PathBuf, on_update: UpdateCallback) {
        let started = Instant::now();
        debug!(path = %path.display(), "starting processing pass");

        let read_path = path.clone();
        let text = match spawn_blocking(move || read_log_text(&read_path)).await {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                debug!(path = %path.display(), error = %err, "activity log not readable yet");
                self.finish_without_log(&on_update);
                return;
            }
            Err(err) => {
                warn!(path = %path.display(), "activity log reader failed: {err:?}");
                self.finish_without_log(&on_update);
                return;
            }
        };

        let samples = Arc::new(Mutex::new(SampleMap::new()));
        let mut scan = {
            let samples = samples.clone();
            let cancel = self.should_cancel.clone();
            spawn_blocking(move || scan_text(&text, &samples, &cancel))
        };

        let period = self.config.update_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let stats = loop {
            tokio::select! {
                result = &mut scan => {
                    break match result {
                        Ok(stats) => stats,
                        Err(err) => {
                            warn!(path = %path.display(), "log scan worker failed: {err:?}");
                            ScanStats::default()
                        }
                    };
                }
                _ = ticker.tick() => {
                    let records = self.snapshot(&samples);
                    debug!(records = records.len(), "partial snapshot");
                    on_update(ProcessUpdate::partial(records));
                }
            }
        };

        let cancelled = self.should_cancel.swap(false, Ordering::AcqRel) || stats.cancelled;
        let records = self.snapshot(&samples);
        lock_samples(&samples).clear();
        self.active.store(false, Ordering::Release);

        info!(
            path = %path.display(),
            records = records.len(),
            scanned = stats.records,
            matched = stats.matched,
            cancelled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "processing pass finished"
        );
        on_update(ProcessUpdate::finished(records, cancelled));
    }

    fn finish_without_log(&self, on_update: &UpdateCallback) {
        self.should_cancel.store(false, Ordering::Release);
        self.active.store(false, Ordering::Release);
        on_update(ProcessUpdate::finished(Vec::new(), false));
    }

    /// Selection happens under the lock; parsing and sorting happen after it
    /// is released.
    fn snapshot(&self, samples: &Mutex<SampleMap>) -> Vec<MeasurementRecord> {
        let selected = {
            let guard = lock_samples(samples);
            select_samples(guard.values())
        };
        into_records(selected, &self.config.symbol_prefixes)
    }
}

fn lock_samples(samples: &Mutex<SampleMap>) -> MutexGuard<'_, SampleMap> {
    match samples.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
