use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Watch path not found: {0:?}")]
    PathNotFound(PathBuf),

    #[error("Filesystem watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Watch coordinator is no longer running")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, WatchError>;
