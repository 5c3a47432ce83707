use std::time::SystemTime;

use anyhow::Context;
use anyhow::Result;
use buildtime_build_index::format_build_duration;
use buildtime_core::MonitorConfig;
use buildtime_core::list_recent_entries;
use clap::Parser;
use owo_colors::OwoColorize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::RootArgs;

#[derive(Debug, Parser)]
pub struct ListArgs {
    #[command(flatten)]
    pub root: RootArgs,
}

pub(crate) fn run_list(args: ListArgs, config: MonitorConfig) -> Result<()> {
    let config = args.root.apply(config);
    let root = config.watch.root_dir.clone();
    let builds = list_recent_entries(&root, &config)
        .with_context(|| format!("Failed to list builds under {}", root.display()))?;

    if builds.is_empty() {
        println!("{} No builds found under {}", "✗".bright_red(), root.display());
        return Ok(());
    }

    for build in &builds {
        let entry = &build.entry;
        let marker = if entry.is_build_type {
            "●".bright_green().to_string()
        } else {
            "○".bright_black().to_string()
        };
        println!(
            "{} {}  {}  {}",
            marker,
            entry.scheme_name.bold(),
            entry.title,
            build.tree.name().bright_black()
        );
        println!(
            "    {}  {}",
            format_timestamp(entry.modification_date).bright_cyan(),
            format_build_duration(entry.build_duration())
        );
    }
    Ok(())
}

fn format_timestamp(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "-".to_string())
}
