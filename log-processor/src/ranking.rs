use crate::measure::MeasurementRecord;
use crate::sample::RawSample;

/// Samples slower than this are shown when there are enough of them.
const PRIMARY_THRESHOLD_MS: f64 = 10.0;
/// Fallback cut-off used when too few samples clear the primary threshold.
const FALLBACK_THRESHOLD_MS: f64 = 0.1;
const MIN_PRIMARY_RESULTS: usize = 20;

/// Picks the samples worth showing: everything above 10ms, or everything
/// above 0.1ms when fewer than 20 samples clear 10ms.
pub(crate) fn select_samples<'a>(
    samples: impl Iterator<Item = &'a RawSample> + Clone,
) -> Vec<RawSample> {
    let primary = samples
        .clone()
        .filter(|sample| sample.time > PRIMARY_THRESHOLD_MS)
        .count();
    let threshold = if primary < MIN_PRIMARY_RESULTS {
        FALLBACK_THRESHOLD_MS
    } else {
        PRIMARY_THRESHOLD_MS
    };

    samples
        .filter(|sample| sample.time > threshold)
        .cloned()
        .collect()
}

/// Sorts selected samples by descending time and parses them into records.
/// Ties are ordered by token so repeated snapshots of the same data agree.
pub(crate) fn into_records(
    mut selected: Vec<RawSample>,
    symbol_prefixes: &[String],
) -> Vec<MeasurementRecord> {
    selected.sort_by(|a, b| {
        b.time
            .total_cmp(&a.time)
            .then_with(|| a.token.cmp(&b.token))
    });
    selected
        .iter()
        .filter_map(|sample| MeasurementRecord::from_sample(sample, symbol_prefixes))
        .collect()
}

/// Filters, sorts and parses accumulated samples into a ranked snapshot.
pub fn rank_samples<'a>(
    samples: impl Iterator<Item = &'a RawSample> + Clone,
    symbol_prefixes: &[String],
) -> Vec<MeasurementRecord> {
    into_records(select_samples(samples), symbol_prefixes)
}
