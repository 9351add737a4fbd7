//! Analyze command - profile a data file and print a summary.

use std::path::PathBuf;

use colored::Colorize;
use strata::{Engine, ProfileOptions, Severity};

pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    delimiter: Option<char>,
    full: bool,
    no_cache: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    println!(
        "{} {}",
        "Profiling".cyan().bold(),
        file.display().to_string().white()
    );

    let csv = std::fs::read_to_string(&file)?;
    let engine = Engine::new();
    let options = ProfileOptions {
        delimiter,
        full_analysis: full,
        use_cache: !no_cache,
        ..ProfileOptions::default()
    };

    let outcome = engine.profile_csv(&csv, &options)?;
    let report = &outcome.report;

    println!();
    println!(
        "{} rows, {} columns ({} numeric, {} categorical), {} missing values",
        report.summary.total_rows.to_string().white().bold(),
        report.summary.total_columns.to_string().white().bold(),
        report.summary.numeric_columns,
        report.summary.categorical_columns,
        report.summary.total_missing_values
    );

    if let Some(sampling) = &outcome.sampling {
        println!(
            "{} {} of {} rows (rate {:.3}{})",
            "Sampled".yellow(),
            sampling.sample_size,
            sampling.original_size,
            sampling.sampling_rate,
            sampling
                .preserved_distribution
                .as_ref()
                .map(|c| format!(", stratified on '{}'", c))
                .unwrap_or_default()
        );
    }
    if outcome.parse_errors > 0 {
        println!(
            "{} {} row(s) skipped by the CSV reader",
            "Warning:".yellow(),
            outcome.parse_errors
        );
    }

    if verbose {
        println!();
        println!("{}", "Columns:".yellow().bold());
        for (name, stats) in &report.column_stats {
            println!(
                "  {:24} {:12} unique {:6}  missing {:5.1}%",
                name,
                format!("{:?}", stats.column_type).to_lowercase(),
                stats.unique,
                stats.missing_percent
            );
        }
    }

    if !report.correlations.all.is_empty() {
        println!();
        println!(
            "{} correlation pair(s): {} strong, {} moderate, {} weak",
            report.correlations.all.len().to_string().white().bold(),
            report.correlations.strong.len().to_string().red(),
            report.correlations.moderate.len().to_string().yellow(),
            report.correlations.weak.len()
        );
    }

    if report.insights.is_empty() {
        println!();
        println!("{}", "No issues found - data looks clean!".green());
    } else {
        println!();
        println!("{}", "Insights:".yellow().bold());
        for insight in &report.insights {
            let severity = match insight.severity {
                Severity::High => "high".red().bold(),
                Severity::Medium => "medium".yellow(),
                Severity::Low => "low".blue(),
            };
            println!("  [{}] {} - {}", severity, insight.category, insight.message);
        }
    }

    if let Some(path) = output {
        report.save(&path)?;
        println!();
        println!(
            "{} {}",
            "Saved report to".green().bold(),
            path.display().to_string().white()
        );
    }

    println!();
    println!(
        "Processed in {} ms ({:.0} rows/s)",
        report.summary.processing.total_ms,
        report.summary.throughput.rows_per_second
    );

    Ok(())
}
