//! # Build Time Log Processor
//!
//! Incremental aggregation of per-expression compile timings out of a build
//! tool's compressed activity log.
//!
//! ## Pipeline
//!
//! ```text
//! activity log (gzip)
//!     │
//!     ├──> decompress → UTF-8 text
//!     │
//!     ├──> scan records split on line terminators
//!     │    └─> `<ms>ms\t/<path>:<line>:<col>\t<symbol>` → RawSample (summed per token)
//!     │
//!     ├──> every tick: threshold filter → sort → MeasurementRecord[] (partial)
//!     │
//!     └──> end of text or cancel: final snapshot (completed)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use buildtime_log_processor::{LogProcessor, ProcessorConfig};
//! use std::sync::Arc;
//!
//! # async fn run(entry: buildtime_build_index::BuildEntry) {
//! let processor = LogProcessor::new(ProcessorConfig::default());
//! let pass = processor.process(&entry, Arc::new(|update| {
//!     println!("{} records (completed: {})", update.records.len(), update.completed);
//! }));
//! let _ = pass.await;
//! # }
//! ```

mod config;
mod error;
mod log_file;
mod measure;
mod processor;
mod ranking;
mod sample;
mod scanner;
mod state;

pub use config::ProcessorConfig;
pub use error::LogReadError;
pub use log_file::read_log_text;
pub use measure::MeasurementRecord;
pub use measure::aggregate_by_file;
pub use processor::LogProcessor;
pub use processor::ProcessUpdate;
pub use processor::UpdateCallback;
pub use ranking::rank_samples;
pub use sample::RawSample;
pub use sample::SampleMap;
pub use scanner::ScanStats;
pub use scanner::scan_text;
pub use state::ProcessingState;
