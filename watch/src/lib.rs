//! Filesystem side of build monitoring.
//!
//! A [`WatchCoordinator`] keeps two non-recursive watches: one on the derived
//! data root and one on the log folder of its newest cache tree. Root events
//! re-resolve the newest tree; log folder events are debounced and then
//! resolved through a [`buildtime_build_index::BuildIndexReader`].

mod config;
mod coordinator;
mod error;
mod path_watcher;
mod tree;

pub use config::WatchConfig;
pub use coordinator::CoordinatorEvent;
pub use coordinator::CoordinatorHandle;
pub use coordinator::WatchCoordinator;
pub use error::Result;
pub use error::WatchError;
pub use path_watcher::PathWatcher;
pub use path_watcher::WatchKind;
pub use tree::CacheTree;
