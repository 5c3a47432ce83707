//! Build monitoring session: configuration, the watch-to-processing
//! composition and project listing.
//!
//! A [`BuildMonitor`] owns a [`buildtime_watch::WatchCoordinator`] and a
//! [`buildtime_log_processor::LogProcessor`]. Detected builds go through a
//! [`PassScheduler`]: one pass runs at a time, a newer build cancels it and
//! waits in a single pending slot.

mod config;
mod error;
mod listing;
mod monitor;
mod scheduler;
mod source;

pub use config::MonitorConfig;
pub use error::ConfigError;
pub use error::MonitorError;
pub use error::Result;
pub use listing::RecentBuild;
pub use listing::list_recent_entries;
pub use monitor::BuildMonitor;
pub use monitor::MonitorEvent;
pub use scheduler::Admission;
pub use scheduler::PassScheduler;
pub use source::BuildCompletion;
pub use source::BuildEventSource;
pub use source::ChannelEventSource;
