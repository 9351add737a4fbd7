//! Compare command - profile two files and diff the reports.

use std::path::PathBuf;

use colored::Colorize;
use strata::{compare_reports, Engine, ProfileOptions, Severity};

pub fn run(
    file1: PathBuf,
    file2: PathBuf,
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    for file in [&file1, &file2] {
        if !file.exists() {
            return Err(format!("File not found: {}", file.display()).into());
        }
    }

    println!(
        "{} {} {} {}",
        "Comparing".cyan().bold(),
        file1.display().to_string().white(),
        "->".dimmed(),
        file2.display().to_string().white()
    );

    let engine = Engine::new();
    let options = ProfileOptions::default();

    let before = engine.profile_csv(&std::fs::read_to_string(&file1)?, &options)?;
    let after = engine.profile_csv(&std::fs::read_to_string(&file2)?, &options)?;
    let diff = compare_reports(&before.report, &after.report);

    println!();
    println!(
        "Rows: {} -> {} ({}{:.1}%)",
        diff.rows.before.to_string().white().bold(),
        diff.rows.after.to_string().white().bold(),
        if diff.rows.delta >= 0 { "+" } else { "" },
        diff.rows.percent
    );

    if !diff.columns_removed.is_empty() {
        println!(
            "{} {}",
            "Removed columns:".red().bold(),
            diff.columns_removed.join(", ")
        );
    }
    if !diff.columns_added.is_empty() {
        println!(
            "{} {}",
            "Added columns:".green().bold(),
            diff.columns_added.join(", ")
        );
    }

    let type_changes: Vec<String> = diff
        .column_changes
        .iter()
        .filter_map(|(name, c)| {
            c.type_change
                .as_ref()
                .map(|label| format!("{} ({})", name, label))
        })
        .collect();
    if !type_changes.is_empty() {
        println!("{} {}", "Type changes:".red().bold(), type_changes.join(", "));
    }

    if verbose {
        println!();
        println!("{}", "Column changes:".yellow().bold());
        for (name, change) in &diff.column_changes {
            let mean_note = change
                .numeric
                .as_ref()
                .map(|n| format!("  mean {:+.2} ({:+.1}%)", n.mean.delta, n.mean.percent))
                .unwrap_or_default();
            println!(
                "  {:24} missing {:+.0}  unique {:+.0}{}",
                name, change.missing.delta, change.unique.delta, mean_note
            );
        }
    }

    let correlations = &diff.correlation_changes;
    if !correlations.added.is_empty()
        || !correlations.removed.is_empty()
        || !correlations.changed.is_empty()
    {
        println!();
        println!(
            "Correlations: {} added, {} removed, {} changed ({} significant, {} sign flips)",
            correlations.added.len(),
            correlations.removed.len(),
            correlations.changed.len(),
            correlations.changed.iter().filter(|c| c.significant).count(),
            correlations.changed.iter().filter(|c| c.sign_change).count()
        );
    }

    if diff.insights.is_empty() {
        println!();
        println!("{}", "No notable changes.".green());
    } else {
        println!();
        println!("{}", "Insights:".yellow().bold());
        for insight in &diff.insights {
            let severity = match insight.severity {
                Severity::High => "high".red().bold(),
                Severity::Medium => "medium".yellow(),
                Severity::Low => "low".blue(),
            };
            println!("  [{}] {} - {}", severity, insight.category, insight.message);
        }
    }

    if let Some(path) = output {
        let file = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &diff)?;
        println!();
        println!(
            "{} {}",
            "Saved comparison to".green().bold(),
            path.display().to_string().white()
        );
    }

    Ok(())
}
