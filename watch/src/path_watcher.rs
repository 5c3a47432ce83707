use std::path::Path;
use std::path::PathBuf;

use notify::Event;
use notify::RecommendedWatcher;
use notify::RecursiveMode;
use notify::Watcher;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::warn;

use crate::error::Result;
use crate::error::WatchError;

/// Which of the coordinator's watches produced a change signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    Root,
    Log,
}

/// Watches a single path, non-recursively, and forwards one `WatchKind`
/// signal per filesystem event.
///
/// Signals are sent from the notify backend thread, never from the caller of
/// [`PathWatcher::start`].
pub struct PathWatcher {
    kind: WatchKind,
    tx: mpsc::UnboundedSender<WatchKind>,
    active: Option<ActiveWatch>,
}

struct ActiveWatch {
    path: PathBuf,
    _watcher: RecommendedWatcher,
}

impl PathWatcher {
    pub fn new(kind: WatchKind, tx: mpsc::UnboundedSender<WatchKind>) -> Self {
        Self {
            kind,
            tx,
            active: None,
        }
    }

    /// Opens a watch on `path`.
    ///
    /// Does nothing while a watch is already open; call [`PathWatcher::stop`]
    /// before pointing the watcher somewhere else. On error the watcher stays
    /// inert.
    pub fn start(&mut self, path: &Path) -> Result<()> {
        if self.active.is_some() {
            return Ok(());
        }
        if !path.exists() {
            return Err(WatchError::PathNotFound(path.to_path_buf()));
        }

        let tx = self.tx.clone();
        let kind = self.kind;
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                // Reads of the manifest must not look like changes.
                Ok(event) if event.kind.is_access() => {}
                Ok(_) => {
                    let _ = tx.send(kind);
                }
                Err(err) => warn!("{kind:?} watcher error: {err}"),
            }
        })?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;

        debug!(kind = ?self.kind, path = %path.display(), "watch started");
        self.active = Some(ActiveWatch {
            path: path.to_path_buf(),
            _watcher: watcher,
        });
        Ok(())
    }

    /// Releases the watch. Safe to call any number of times.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(kind = ?self.kind, path = %active.path.display(), "watch stopped");
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.active.as_ref().map(|active| active.path.as_path())
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
