use anyhow::Context;
use anyhow::Result;
use buildtime_log_processor::MeasurementRecord;
use buildtime_log_processor::aggregate_by_file;
use owo_colors::OwoColorize;

use crate::OutputArgs;

const SYMBOL_WIDTH: usize = 80;

/// Table cells of one result row, before coloring.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Row {
    pub rank: usize,
    pub time: String,
    pub references: usize,
    pub location: String,
    pub symbol: String,
}

pub(crate) fn rows(records: &[MeasurementRecord], output: &OutputArgs) -> Vec<Row> {
    let aggregated;
    let records = if output.per_file {
        aggregated = aggregate_by_file(records);
        aggregated.as_slice()
    } else {
        records
    };

    records
        .iter()
        .take(output.limit)
        .enumerate()
        .map(|(index, record)| Row {
            rank: index + 1,
            time: record.time_label(),
            references: record.references,
            location: if output.per_file {
                record.filename.clone()
            } else {
                record.file_info()
            },
            symbol: truncate(&record.symbol, SYMBOL_WIDTH),
        })
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

pub(crate) fn print_records(records: &[MeasurementRecord], output: &OutputArgs) -> Result<()> {
    if output.json {
        let json = if output.per_file {
            serde_json::to_string_pretty(&aggregate_by_file(records))
        } else {
            serde_json::to_string_pretty(records)
        }
        .context("Failed to serialize records")?;
        println!("{json}");
        return Ok(());
    }

    let rows = rows(records, output);
    let location_width = rows
        .iter()
        .map(|row| row.location.chars().count())
        .max()
        .unwrap_or(0)
        .max("Location".len());

    println!(
        "{}",
        format!(
            "{:>4}  {:>10}  {:>5}  {:<location_width$}  Symbol",
            "#", "Time", "Refs", "Location"
        )
        .bold()
    );
    for row in &rows {
        println!(
            "{}  {}  {:>5}  {}  {}",
            format!("{:>4}", row.rank).bright_black(),
            format!("{:>10}", row.time).bright_yellow(),
            row.references,
            format!("{:<location_width$}", row.location).bright_cyan(),
            row.symbol
        );
    }
    if records.len() > rows.len() && !output.per_file {
        println!(
            "{}",
            format!("… {} more", records.len() - rows.len()).dimmed()
        );
    }
    Ok(())
}
