use std::collections::HashMap;

use serde::Serialize;

use crate::sample::RawSample;

/// Symbol shown when a token carries no tab-separated symbol text.
const MISSING_SYMBOL: &str = "-";

/// A display-ready timing for one source location, or for a whole file when
/// built through [`aggregate_by_file`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRecord {
    /// Milliseconds
    pub time: f64,
    /// Source file path, without the `:line:col` suffix
    pub path: String,
    pub symbol: String,
    pub filename: String,
    pub line: u32,
    pub column: u32,
    pub references: usize,
}

impl MeasurementRecord {
    /// Parses a `<path>:<line>:<col>` location.
    ///
    /// Returns `None` unless exactly two numeric components follow the first
    /// `:`.
    pub fn parse(time: f64, raw_path: &str, symbol: &str, references: usize) -> Option<Self> {
        let (path, location) = raw_path.split_once(':')?;
        let filename = filename_of(path)?;

        let numbers: Vec<u32> = location
            .split(':')
            .filter(|part| !part.is_empty())
            .filter_map(|part| part.parse().ok())
            .collect();
        let [line, column] = numbers.as_slice() else {
            return None;
        };

        Some(Self {
            time,
            path: path.to_string(),
            symbol: symbol.to_string(),
            filename: filename.to_string(),
            line: *line,
            column: *column,
            references,
        })
    }

    /// Builds a record from an accumulated sample, stripping the configured
    /// declaration markers from its symbol.
    pub fn from_sample(sample: &RawSample, symbol_prefixes: &[String]) -> Option<Self> {
        let mut parts = sample.token.split('\t').filter(|part| !part.is_empty());
        let raw_path = parts.next()?.trim_matches(|c: char| c == '\r' || c == '"');
        let symbol = match parts.next() {
            Some(symbol) => strip_prefixes(symbol.trim_end_matches('\r'), symbol_prefixes),
            None => MISSING_SYMBOL,
        };
        Self::parse(sample.time, raw_path, symbol, sample.references)
    }

    /// Synthetic per-file record: no symbol, location pinned to `1:1`.
    pub fn file_total(path: &str, time: f64, references: usize) -> Option<Self> {
        let filename = filename_of(path)?;
        Some(Self {
            time,
            path: path.to_string(),
            symbol: String::new(),
            filename: filename.to_string(),
            line: 1,
            column: 1,
            references,
        })
    }

    pub fn file_and_line(&self) -> String {
        format!("{}:{}", self.filename, self.line)
    }

    pub fn file_info(&self) -> String {
        format!("{}:{}", self.file_and_line(), self.column)
    }

    pub fn time_label(&self) -> String {
        format!("{:.1}ms", self.time)
    }

    /// Case-insensitive filename match; an empty filter matches everything.
    pub fn matches(&self, filter: &str) -> bool {
        filter.is_empty()
            || self
                .filename
                .to_lowercase()
                .contains(&filter.to_lowercase())
    }
}

fn filename_of(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    path.rsplit('/').find(|part| !part.is_empty())
}

fn strip_prefixes<'a>(symbol: &'a str, prefixes: &[String]) -> &'a str {
    prefixes.iter().fold(symbol, |symbol, prefix| {
        symbol.strip_prefix(prefix.as_str()).unwrap_or(symbol)
    })
}

/// Collapses records into one per file, summing time and references, sorted
/// by descending total time.
pub fn aggregate_by_file(records: &[MeasurementRecord]) -> Vec<MeasurementRecord> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();

    for record in records {
        let total = totals.entry(record.path.as_str()).or_insert_with(|| {
            order.push(record.path.as_str());
            (0.0, 0)
        });
        total.0 += record.time;
        total.1 += record.references;
    }

    let mut aggregated: Vec<MeasurementRecord> = order
        .into_iter()
        .filter_map(|path| {
            let (time, references) = totals.get(path)?;
            MeasurementRecord::file_total(path, *time, *references)
        })
        .collect();
    aggregated.sort_by(|a, b| b.time.total_cmp(&a.time).then_with(|| a.path.cmp(&b.path)));
    aggregated
}
