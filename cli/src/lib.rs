mod analyze_cmd;
mod list_cmd;
mod logging;
mod render;
mod watch_cmd;

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use buildtime_core::MonitorConfig;
use clap::Args;
use clap::Parser;
use clap::Subcommand;

pub use analyze_cmd::AnalyzeArgs;
pub use list_cmd::ListArgs;
pub use logging::init_tracing;
pub use watch_cmd::WatchArgs;

/// Ranks the slowest type-checked expressions and functions of a build.
#[derive(Debug, Parser)]
#[command(name = "buildtime", version)]
pub struct Cli {
    /// Config file (defaults to <config dir>/buildtime/config.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch derived data and report every new build
    Watch(WatchArgs),

    /// Process one cache tree, log folder or activity log
    Analyze(AnalyzeArgs),

    /// List the latest recorded build of every project
    List(ListArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RootArgs {
    /// Derived data root to watch instead of the configured one
    #[arg(long, env = "BUILDTIME_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,
}

impl RootArgs {
    fn apply(&self, config: MonitorConfig) -> MonitorConfig {
        match &self.root {
            Some(root) => config.with_root(root.clone()),
            None => config,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Sum timings per file instead of listing every location
    #[arg(long)]
    pub per_file: bool,

    /// Number of rows to print
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,

    /// Print records as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = MonitorConfig::load_or_default(self.config.as_deref())
            .context("Failed to load configuration")?;

        match self.command {
            Command::Watch(args) => watch_cmd::run_watch(args, config).await,
            Command::Analyze(args) => analyze_cmd::run_analyze(args, config).await,
            Command::List(args) => list_cmd::run_list(args, config),
        }
    }
}
