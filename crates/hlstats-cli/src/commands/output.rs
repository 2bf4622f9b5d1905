//! Output formatting for replay results.

use anyhow::Result;

use super::replay::ReplayReport;
use crate::OutputFormat;

/// Print a replay report in the specified format.
pub fn print(report: &ReplayReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report),
        OutputFormat::Json => return print_json(report),
        OutputFormat::Compact => print_compact(report),
    }
    Ok(())
}

fn print_text(report: &ReplayReport) {
    for (i, batch) in report.batches.iter().enumerate() {
        println!("Batch {}: {}", i + 1, batch.summary());
        for file in batch.file_to_highlights.values() {
            println!("  {}", file.path.display());
            for record in &file.highlights {
                println!("    {record}");
            }
        }
        println!();
    }

    for lookup in &report.lookups {
        if lookup.classes.is_empty() {
            println!("lookup {}: \x1b[33mnot found\x1b[0m", lookup.name);
        }
        for class in &lookup.classes {
            println!("lookup {}: {}", lookup.name, class);
        }
    }

    println!(
        "\x1b[32mReplayed {} file(s), skipped {}, emitted {} batch(es)\x1b[0m",
        report.files_highlighted,
        report.files_skipped,
        report.batches.len()
    );
}

fn print_json(report: &ReplayReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}

fn print_compact(report: &ReplayReport) {
    for batch in &report.batches {
        println!("{}", batch.summary());
    }
    for lookup in &report.lookups {
        let classes: Vec<String> = lookup.classes.iter().map(ToString::to_string).collect();
        println!("lookup {} -> [{}]", lookup.name, classes.join(", "));
    }
}
