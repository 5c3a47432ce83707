use anyhow::Context;
use anyhow::Result;
use buildtime_build_index::format_build_duration;
use buildtime_core::BuildMonitor;
use buildtime_core::MonitorConfig;
use buildtime_core::MonitorEvent;
use buildtime_log_processor::ProcessUpdate;
use buildtime_log_processor::ProcessingState;
use clap::Parser;
use owo_colors::OwoColorize;
use tokio::sync::mpsc;
use tracing::info;

use crate::OutputArgs;
use crate::RootArgs;
use crate::analyze_cmd::print_entry_header;
use crate::render::print_records;

#[derive(Debug, Parser)]
pub struct WatchArgs {
    #[command(flatten)]
    pub root: RootArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub(crate) async fn run_watch(args: WatchArgs, config: MonitorConfig) -> Result<()> {
    let config = args.root.apply(config);
    let root = config.watch.root_dir.clone();
    let (tx, mut events) = mpsc::unbounded_channel();
    let monitor = BuildMonitor::start(config, tx)
        .with_context(|| format!("Failed to watch {}", root.display()))?;
    info!("watching {}", root.display());

    loop {
        tokio::select! {
            maybe = events.recv() => {
                let Some(event) = maybe else { break; };
                if let Err(err) = print_event(&event, &args.output) {
                    monitor.cancel();
                    monitor.stop().await;
                    return Err(err);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                monitor.cancel();
                break;
            }
        }
    }

    monitor.stop().await;
    Ok(())
}

fn print_event(event: &MonitorEvent, output: &OutputArgs) -> Result<()> {
    match event {
        MonitorEvent::State(state @ ProcessingState::Watching { indicating: true }) => {
            if !output.json {
                println!("{} {}", "…".bright_black(), state.label());
            }
        }
        MonitorEvent::State(_) => {}
        MonitorEvent::DerivedDataChanged { newest } => match newest {
            Some(tree) => info!("newest cache tree: {}", tree.name()),
            None => info!("no cache tree under the watched root"),
        },
        MonitorEvent::PassStarted(entry) => {
            if !output.json {
                print_entry_header(entry);
            }
        }
        MonitorEvent::Snapshot(update) => print_snapshot(update, output)?,
        MonitorEvent::BuildCompleted(completion) => {
            if !output.json {
                let marker = if completion.succeeded {
                    "✓".bright_green().to_string()
                } else {
                    "✗".bright_red().to_string()
                };
                println!(
                    "{} {} finished in {}",
                    marker,
                    completion.name.bold(),
                    format_build_duration(completion.duration.as_secs())
                );
            }
        }
    }
    Ok(())
}

fn print_snapshot(update: &ProcessUpdate, output: &OutputArgs) -> Result<()> {
    if !update.completed {
        if !output.json {
            println!(
                "  {} {} locations so far",
                ProcessingState::Processing.label().bright_black(),
                update.records.len()
            );
        }
        return Ok(());
    }

    if !update.records.is_empty() {
        print_records(&update.records, output)?;
    }
    if !output.json {
        let state = update.state();
        let label = if update.cancelled || update.records.is_empty() {
            state.label().bright_red().to_string()
        } else {
            state.label().bright_green().to_string()
        };
        println!("{label}");
    }
    Ok(())
}
