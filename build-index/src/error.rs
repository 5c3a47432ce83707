use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildIndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest parse error: {0}")]
    Manifest(#[from] plist::Error),

    #[error("Manifest {0:?} has no `logs` dictionary")]
    MissingLogs(PathBuf),

    #[error("Manifest {0:?} kept changing while it was read")]
    Unstable(PathBuf),

    #[error("Entry {key} is missing required field `{field}`")]
    MissingField { key: String, field: &'static str },
}

pub type Result<T> = std::result::Result<T, BuildIndexError>;
