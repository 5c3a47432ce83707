use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use buildtime_build_index::BuildEntry;
use buildtime_build_index::BuildIndexReader;
use buildtime_build_index::format_build_duration;
use buildtime_core::MonitorConfig;
use buildtime_log_processor::LogProcessor;
use buildtime_log_processor::ProcessUpdate;
use clap::Parser;
use owo_colors::OwoColorize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::OutputArgs;
use crate::render::print_records;

#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Cache tree, log folder, or `.xcactivitylog` file
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub(crate) async fn run_analyze(args: AnalyzeArgs, config: MonitorConfig) -> Result<()> {
    let reader = BuildIndexReader::new(config.index.clone());
    let (log_path, entry) = resolve_target(&args.path, &reader)?;
    if let Some(entry) = &entry
        && !args.output.json
    {
        print_entry_header(entry);
    }

    let processor = LogProcessor::new(config.processor.clone());
    let (tx, mut updates) = mpsc::unbounded_channel();
    let pass = processor.process_log_file(
        log_path,
        Arc::new(move |update| {
            let _ = tx.send(update);
        }),
    );

    let mut last: Option<ProcessUpdate> = None;
    loop {
        tokio::select! {
            maybe = updates.recv() => {
                let Some(update) = maybe else { break; };
                if update.completed {
                    last = Some(update);
                    break;
                }
                debug!(records = update.records.len(), "partial snapshot");
            }
            _ = tokio::signal::ctrl_c() => processor.cancel(),
        }
    }
    pass.await.context("Processing task failed")?;

    let update = last.context("Processing ended without a final snapshot")?;
    let state = update.state();
    if update.records.is_empty() || update.cancelled {
        eprintln!("{} {}", "✗".bright_red(), state.label());
        if update.records.is_empty() {
            return Ok(());
        }
    }
    print_records(&update.records, &args.output)
}

/// Maps a user-supplied path to the activity log to process.
fn resolve_target(
    path: &Path,
    reader: &BuildIndexReader,
) -> Result<(PathBuf, Option<BuildEntry>)> {
    if path.is_file() {
        return Ok((path.to_path_buf(), None));
    }
    if !path.is_dir() {
        anyhow::bail!("{} does not exist", path.display());
    }

    let entry = if reader.manifest_path(path).is_file() {
        reader.read_log_folder(path)
    } else {
        reader.read(path)
    };
    let entry =
        entry.with_context(|| format!("No recorded build found under {}", path.display()))?;
    Ok((entry.log_path(), Some(entry)))
}

pub(crate) fn print_entry_header(entry: &BuildEntry) {
    println!(
        "{} {} {}",
        "▶".bright_blue(),
        entry.scheme_name.bold(),
        entry.title.bright_black()
    );
    println!(
        "  Build duration: {}",
        format_build_duration(entry.build_duration()).bright_cyan()
    );
}
