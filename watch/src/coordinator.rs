use std::path::PathBuf;
use std::pin::Pin;

use buildtime_build_index::BuildEntry;
use buildtime_build_index::BuildIndexReader;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::task::spawn_blocking;
use tokio::time::Sleep;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::WatchConfig;
use crate::error::Result;
use crate::error::WatchError;
use crate::path_watcher::PathWatcher;
use crate::path_watcher::WatchKind;
use crate::tree::CacheTree;

/// Notifications emitted by a running [`WatchCoordinator`].
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    /// The root changed; sent on every root event, even when the newest tree
    /// stayed the same
    DerivedDataChanged { newest: Option<CacheTree> },

    /// The log watch moved; `None` when no log folder is being watched
    LogWatchChanged { folder: Option<PathBuf> },

    /// A build-type entry that differs from the previously delivered one
    BuildDetected(BuildEntry),
}

enum Command {
    SetRoot {
        root: PathBuf,
        reply: oneshot::Sender<Result<()>>,
    },
    Refresh,
}

/// Cheap handle for steering a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl CoordinatorHandle {
    /// Stops both watches, switches to `root`, rescans and restarts.
    pub async fn set_root(&self, root: PathBuf) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::SetRoot { root, reply })
            .map_err(|_| WatchError::Stopped)?;
        response.await.map_err(|_| WatchError::Stopped)?
    }

    /// Re-reads the watched log folder as if it had just changed.
    pub fn refresh(&self) {
        let _ = self.commands.send(Command::Refresh);
    }
}

/// Keeps a root watch and a log-folder watch pointed at the newest cache tree
/// and reports new build entries.
///
/// All coordinator state lives in one task; watcher threads only feed it
/// signals.
pub struct WatchCoordinator {
    handle: CoordinatorHandle,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl WatchCoordinator {
    /// Opens the root watch and spawns the coordinator task.
    ///
    /// Fails when the root cannot be watched; nothing is spawned then.
    pub fn start(
        config: WatchConfig,
        reader: BuildIndexReader,
        events: mpsc::UnboundedSender<CoordinatorEvent>,
    ) -> Result<Self> {
        let (signal_tx, signals) = mpsc::unbounded_channel();
        let mut root_watch = PathWatcher::new(WatchKind::Root, signal_tx.clone());
        root_watch.start(&config.root_dir)?;
        info!(root = %config.root_dir.display(), "watching derived data root");

        let (commands_tx, commands) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let actor = Coordinator {
            config,
            reader,
            events,
            root_watch,
            log_watch: PathWatcher::new(WatchKind::Log, signal_tx),
            log_folder: None,
            delivered: DeliveryFilter::default(),
        };
        let task = tokio::spawn(actor.run(signals, commands, shutdown.clone()));

        Ok(Self {
            handle: CoordinatorHandle {
                commands: commands_tx,
            },
            shutdown,
            task,
        })
    }

    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    pub async fn set_root(&self, root: PathBuf) -> Result<()> {
        self.handle.set_root(root).await
    }

    pub fn refresh(&self) {
        self.handle.refresh();
    }

    /// Releases both watches and waits for the task to exit.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(err) = self.task.await {
            warn!("watch coordinator task failed: {err:?}");
        }
    }
}

/// Decides which read results are worth reporting.
#[derive(Debug, Default)]
pub(crate) struct DeliveryFilter {
    last_delivered: Option<BuildEntry>,
}

impl DeliveryFilter {
    /// Passes a build-type entry through unless it equals the last one passed.
    pub(crate) fn accept(&mut self, entry: Option<BuildEntry>) -> Option<BuildEntry> {
        let entry = entry?;
        if !entry.is_build_type {
            debug!(title = %entry.title, "ignoring non-build entry");
            return None;
        }
        if self.last_delivered.as_ref() == Some(&entry) {
            return None;
        }
        self.last_delivered = Some(entry.clone());
        Some(entry)
    }
}

struct Coordinator {
    config: WatchConfig,
    reader: BuildIndexReader,
    events: mpsc::UnboundedSender<CoordinatorEvent>,
    root_watch: PathWatcher,
    log_watch: PathWatcher,
    /// Set only while the log watch is open on it
    log_folder: Option<PathBuf>,
    delivered: DeliveryFilter,
}

impl Coordinator {
    async fn run(
        mut self,
        mut signals: mpsc::UnboundedReceiver<WatchKind>,
        mut commands: mpsc::UnboundedReceiver<Command>,
        shutdown: CancellationToken,
    ) {
        self.resolve_newest_tree().await;

        let mut flush_timer: Option<Pin<Box<Sleep>>> = None;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                maybe = commands.recv() => {
                    let Some(command) = maybe else { break; };
                    match command {
                        Command::SetRoot { root, reply } => {
                            flush_timer = None;
                            let result = self.set_root(root).await;
                            let _ = reply.send(result);
                        }
                        Command::Refresh => {
                            if flush_timer.is_none() {
                                flush_timer = Some(Box::pin(sleep(self.config.debounce())));
                            }
                        }
                    }
                }
                maybe = signals.recv() => {
                    let Some(kind) = maybe else { break; };
                    match kind {
                        WatchKind::Root => self.resolve_newest_tree().await,
                        WatchKind::Log => {
                            // The manifest is not complete when the event fires.
                            if flush_timer.is_none() {
                                flush_timer = Some(Box::pin(sleep(self.config.debounce())));
                            }
                        }
                    }
                }
                _ = async {
                    if let Some(timer) = &mut flush_timer {
                        timer.await;
                    }
                }, if flush_timer.is_some() => {
                    flush_timer = None;
                    self.read_log_folder().await;
                }
            }
        }

        self.log_watch.stop();
        self.root_watch.stop();
        debug!("watch coordinator stopped");
    }

    async fn set_root(&mut self, root: PathBuf) -> Result<()> {
        info!(root = %root.display(), "switching derived data root");
        self.root_watch.stop();
        self.repoint_log_watch(None);
        self.config.root_dir = root;

        let started = self.root_watch.start(&self.config.root_dir);
        if let Err(err) = &started {
            warn!(root = %self.config.root_dir.display(), "root watch failed: {err}");
        }
        self.resolve_newest_tree().await;
        started
    }

    async fn resolve_newest_tree(&mut self) {
        let root = self.config.root_dir.clone();
        let excluded = self.config.excluded_dirs.clone();
        let newest = match spawn_blocking(move || CacheTree::newest(&root, &excluded)).await {
            Ok(Ok(newest)) => newest,
            Ok(Err(err)) => {
                debug!("cannot scan derived data root: {err}");
                None
            }
            Err(err) => {
                warn!("derived data scan failed: {err:?}");
                None
            }
        };

        let folder = newest
            .as_ref()
            .map(|tree| self.reader.log_folder(&tree.path));
        if folder != self.log_folder {
            self.repoint_log_watch(folder);
        }

        let _ = self
            .events
            .send(CoordinatorEvent::DerivedDataChanged { newest });
    }

    fn repoint_log_watch(&mut self, folder: Option<PathBuf>) {
        let previous = self.log_folder.take();
        self.log_watch.stop();

        if let Some(folder) = folder {
            match self.log_watch.start(&folder) {
                Ok(()) => {
                    info!(folder = %folder.display(), "watching build logs");
                    self.log_folder = Some(folder);
                }
                // Left unset so the next root event tries again.
                Err(err) => debug!(folder = %folder.display(), "log watch not started: {err}"),
            }
        }

        if previous != self.log_folder {
            let _ = self.events.send(CoordinatorEvent::LogWatchChanged {
                folder: self.log_folder.clone(),
            });
        }
    }

    async fn read_log_folder(&mut self) {
        let Some(folder) = self.log_folder.clone() else {
            return;
        };
        let reader = self.reader.clone();
        let entry = match spawn_blocking(move || reader.read_log_folder(&folder)).await {
            Ok(entry) => entry,
            Err(err) => {
                warn!("manifest read failed: {err:?}");
                return;
            }
        };

        if let Some(entry) = self.delivered.accept(entry) {
            info!(
                scheme = %entry.scheme_name,
                title = %entry.title,
                key = %entry.entry_key,
                "new build detected"
            );
            let _ = self.events.send(CoordinatorEvent::BuildDetected(entry));
        }
    }
}
