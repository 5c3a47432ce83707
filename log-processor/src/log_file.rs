use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::LogReadError;

/// Decompresses a gzip activity log into UTF-8 text.
pub fn read_log_text(path: &Path) -> Result<String, LogReadError> {
    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;
    Ok(String::from_utf8(bytes)?)
}
