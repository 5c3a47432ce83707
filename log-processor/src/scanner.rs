use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::sample::SampleMap;

/// Leading duration, a tab, then the start of an absolute path.
static TIMING_RECORD: Lazy<Regex> = Lazy::new(|| {
    let pattern = r"^\d*\.?\d*ms\t/";
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid regex literal {pattern}: {err}"))
});

/// Length of the `ms\t/` tail of a [`TIMING_RECORD`] match.
const DURATION_SUFFIX_LEN: usize = 4;

/// Counters for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub records: usize,
    pub matched: usize,
    pub cancelled: bool,
}

fn is_terminator(c: char) -> bool {
    c == '\r' || c == '\n'
}

/// Splits one terminated record into its duration and its token (from the
/// leading `/` of the path to the end of the record).
fn parse_record(record: &str) -> Option<(f64, &str)> {
    let found = TIMING_RECORD.find(record)?;
    let time = record[..found.end() - DURATION_SUFFIX_LEN]
        .parse::<f64>()
        .ok()?;
    Some((time, &record[found.end() - 1..]))
}

/// Scans `text` record by record and merges every timing record into
/// `samples`.
///
/// A trailing fragment without a terminator is still being written and is
/// left alone. `cancel` is checked before each record; once it is set the
/// scan stops and everything merged so far stays in `samples`.
pub fn scan_text(text: &str, samples: &Mutex<SampleMap>, cancel: &AtomicBool) -> ScanStats {
    let mut stats = ScanStats::default();
    let mut rest = text;

    while let Some(end) = rest.find(is_terminator) {
        if cancel.load(Ordering::Acquire) {
            stats.cancelled = true;
            break;
        }

        let record = &rest[..end];
        rest = &rest[end + 1..];
        stats.records += 1;

        let Some((time, token)) = parse_record(record) else {
            continue;
        };
        stats.matched += 1;

        let mut guard = match samples.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.record(token, time);
    }

    stats
}
