use thiserror::Error;

/// Why an activity log could not be turned into text.
///
/// The processor treats all of these as "no log yet": the file may not be
/// flushed or fully compressed when the manifest already names it.
#[derive(Error, Debug)]
pub enum LogReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
