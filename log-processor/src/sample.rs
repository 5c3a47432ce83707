use std::collections::HashMap;

/// Accumulated timing for one unparsed `path:line:col\tsymbol` token.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    /// Summed milliseconds over every occurrence of the token
    pub time: f64,

    pub token: String,

    /// Number of occurrences merged into this sample
    pub references: usize,
}

impl RawSample {
    pub fn new(time: f64, token: impl Into<String>) -> Self {
        Self {
            time,
            token: token.into(),
            references: 1,
        }
    }
}

/// Samples of one pass keyed by their token text.
#[derive(Debug, Default)]
pub struct SampleMap {
    samples: HashMap<String, RawSample>,
}

impl SampleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one occurrence of `token`.
    pub fn record(&mut self, token: &str, time: f64) {
        match self.samples.get_mut(token) {
            Some(sample) => {
                sample.time += time;
                sample.references += 1;
            }
            None => {
                self.samples
                    .insert(token.to_string(), RawSample::new(time, token));
            }
        }
    }

    pub fn get(&self, token: &str) -> Option<&RawSample> {
        self.samples.get(token)
    }

    pub fn values(&self) -> impl Iterator<Item = &RawSample> + Clone {
        self.samples.values()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repeated_tokens_sum_time_and_count_references() {
        let mut map = SampleMap::new();
        map.record("/a/b.swift:3:4\tfoo()", 12.5);
        map.record("/a/b.swift:3:4\tfoo()", 3.0);
        map.record("/a/b.swift:3:4\tfoo()", 0.5);
        map.record("/a/c.swift:1:1\tbar()", 1.0);

        assert_eq!(map.len(), 2);
        let sample = map.get("/a/b.swift:3:4\tfoo()").expect("merged sample");
        assert_eq!(sample.time, 16.0);
        assert_eq!(sample.references, 3);
        assert_eq!(map.get("/a/c.swift:1:1\tbar()").map(|s| s.references), Some(1));
    }

    #[test]
    fn distinct_symbols_at_same_location_stay_separate() {
        let mut map = SampleMap::new();
        map.record("/a/b.swift:3:4\tfoo()", 1.0);
        map.record("/a/b.swift:3:4\tbar()", 1.0);
        assert_eq!(map.len(), 2);

        map.clear();
        assert!(map.is_empty());
    }
}
