use std::path::PathBuf;
use std::sync::Arc;

use buildtime_build_index::BuildEntry;
use buildtime_build_index::BuildIndexReader;
use buildtime_log_processor::LogProcessor;
use buildtime_log_processor::ProcessUpdate;
use buildtime_log_processor::ProcessingState;
use buildtime_log_processor::UpdateCallback;
use buildtime_watch::CacheTree;
use buildtime_watch::CoordinatorEvent;
use buildtime_watch::CoordinatorHandle;
use buildtime_watch::WatchCoordinator;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::scheduler::Admission;
use crate::scheduler::PassScheduler;
use crate::source::BuildCompletion;
use crate::source::BuildEventSource;

/// Everything a consumer of a [`BuildMonitor`] gets to see, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    State(ProcessingState),

    /// The derived data root changed; project listings should be refreshed
    DerivedDataChanged { newest: Option<CacheTree> },

    PassStarted(BuildEntry),

    /// Partial or final snapshot of the active pass
    Snapshot(ProcessUpdate),

    /// Reported by an attached [`BuildEventSource`]
    BuildCompleted(BuildCompletion),
}

enum MonitorCommand {
    ProcessEntry(BuildEntry),
    Cancel,
}

/// Watches the derived data root and runs a processing pass for every new
/// build, one at a time.
pub struct BuildMonitor {
    commands: mpsc::UnboundedSender<MonitorCommand>,
    coordinator: WatchCoordinator,
    processor: LogProcessor,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl BuildMonitor {
    pub fn start(
        config: MonitorConfig,
        events: mpsc::UnboundedSender<MonitorEvent>,
    ) -> Result<Self> {
        Self::start_with_source(config, None, events)
    }

    /// Like [`BuildMonitor::start`], additionally re-publishing completions
    /// from `source`; each one also makes the monitor re-read the log folder.
    pub fn start_with_source(
        config: MonitorConfig,
        source: Option<Box<dyn BuildEventSource>>,
        events: mpsc::UnboundedSender<MonitorEvent>,
    ) -> Result<Self> {
        config.validate()?;
        let MonitorConfig {
            watch,
            index,
            processor,
        } = config;

        let (coordinator_tx, coordinator_events) = mpsc::unbounded_channel();
        let coordinator =
            WatchCoordinator::start(watch, BuildIndexReader::new(index), coordinator_tx)?;

        let (completions_tx, completions) = mpsc::unbounded_channel();
        if let Some(source) = source {
            source.subscribe(completions_tx);
        }

        let processor = LogProcessor::new(processor);
        let (updates_tx, updates) = mpsc::unbounded_channel();
        let on_update: UpdateCallback = Arc::new(move |update| {
            let _ = updates_tx.send(update);
        });

        let (commands_tx, commands) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let actor = Monitor {
            processor: processor.clone(),
            on_update,
            scheduler: PassScheduler::new(),
            coordinator: coordinator.handle(),
            events,
            watching_logs: false,
        };
        let task = tokio::spawn(actor.run(
            Inputs {
                coordinator_events,
                completions,
                updates,
                commands,
            },
            shutdown.clone(),
        ));

        Ok(Self {
            commands: commands_tx,
            coordinator,
            processor,
            shutdown,
            task,
        })
    }

    /// Requests a pass for an entry picked by the consumer, under the same
    /// admission rules as detected builds.
    pub fn process_entry(&self, entry: BuildEntry) {
        let _ = self.commands.send(MonitorCommand::ProcessEntry(entry));
    }

    /// Cancels the active pass and drops any pending entry.
    pub fn cancel(&self) {
        let _ = self.commands.send(MonitorCommand::Cancel);
    }

    pub async fn set_root(&self, root: PathBuf) -> Result<()> {
        self.coordinator.set_root(root).await?;
        Ok(())
    }

    /// Re-reads the watched log folder.
    pub fn refresh(&self) {
        self.coordinator.refresh();
    }

    pub fn coordinator(&self) -> CoordinatorHandle {
        self.coordinator.handle()
    }

    pub async fn stop(self) {
        self.processor.cancel();
        self.shutdown.cancel();
        if let Err(err) = self.task.await {
            warn!("build monitor task failed: {err:?}");
        }
        self.coordinator.stop().await;
    }
}

struct Inputs {
    coordinator_events: mpsc::UnboundedReceiver<CoordinatorEvent>,
    completions: mpsc::UnboundedReceiver<BuildCompletion>,
    updates: mpsc::UnboundedReceiver<ProcessUpdate>,
    commands: mpsc::UnboundedReceiver<MonitorCommand>,
}

struct Monitor {
    processor: LogProcessor,
    on_update: UpdateCallback,
    scheduler: PassScheduler,
    coordinator: CoordinatorHandle,
    events: mpsc::UnboundedSender<MonitorEvent>,
    watching_logs: bool,
}

impl Monitor {
    async fn run(mut self, mut inputs: Inputs, shutdown: CancellationToken) {
        self.set_state(ProcessingState::Watching { indicating: false });

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(event) = inputs.coordinator_events.recv() => self.on_coordinator_event(event),
                Some(update) = inputs.updates.recv() => self.on_update(update),
                Some(command) = inputs.commands.recv() => match command {
                    MonitorCommand::ProcessEntry(entry) => self.admit(entry),
                    MonitorCommand::Cancel => self.cancel(),
                },
                Some(completion) = inputs.completions.recv() => {
                    info!(
                        name = %completion.name,
                        succeeded = completion.succeeded,
                        duration_secs = completion.duration.as_secs(),
                        "build completed"
                    );
                    self.emit(MonitorEvent::BuildCompleted(completion));
                    self.coordinator.refresh();
                }
            }
        }

        self.set_state(ProcessingState::Idle);
        debug!("build monitor stopped");
    }

    fn on_coordinator_event(&mut self, event: CoordinatorEvent) {
        match event {
            CoordinatorEvent::DerivedDataChanged { newest } => {
                self.emit(MonitorEvent::DerivedDataChanged { newest });
            }
            CoordinatorEvent::LogWatchChanged { folder } => {
                self.watching_logs = folder.is_some();
                if !self.scheduler.is_active() {
                    self.set_state(ProcessingState::Watching {
                        indicating: self.watching_logs,
                    });
                }
            }
            CoordinatorEvent::BuildDetected(entry) => self.admit(entry),
        }
    }

    fn admit(&mut self, entry: BuildEntry) {
        let key = entry.entry_key.clone();
        match self.scheduler.offer(entry) {
            Admission::Start(entry) => self.start_pass(entry),
            Admission::Queued => {
                info!(key = %key, "newer build queued, cancelling active pass");
                self.processor.cancel();
            }
            Admission::Ignored => debug!(key = %key, "build already being processed"),
        }
    }

    fn start_pass(&mut self, entry: BuildEntry) {
        info!(
            scheme = %entry.scheme_name,
            key = %entry.entry_key,
            log = %entry.log_path().display(),
            "processing build log"
        );
        // Detached; the terminal update reports the end of the pass.
        let _pass = self.processor.process(&entry, self.on_update.clone());
        self.emit(MonitorEvent::PassStarted(entry));
        self.set_state(ProcessingState::Processing);
    }

    fn on_update(&mut self, update: ProcessUpdate) {
        let completed = update.completed;
        let state = update.state();
        self.emit(MonitorEvent::Snapshot(update));
        if !completed {
            return;
        }

        self.set_state(state);
        if let Some(next) = self.scheduler.finish() {
            self.start_pass(next);
        }
    }

    fn cancel(&mut self) {
        if let Some(dropped) = self.scheduler.clear_pending() {
            debug!(key = %dropped.entry_key, "dropping pending build");
        }
        if self.scheduler.is_active() {
            self.processor.cancel();
        }
    }

    fn set_state(&self, state: ProcessingState) {
        self.emit(MonitorEvent::State(state));
    }

    fn emit(&self, event: MonitorEvent) {
        let _ = self.events.send(event);
    }
}
