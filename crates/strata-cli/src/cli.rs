//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// strata: tabular-data profiling engine
#[derive(Parser)]
#[command(name = "strata")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Profile a delimited data file and print a summary
    Analyze {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the full report as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Field delimiter (default: auto-detect)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Analyze every row, even for large inputs
        #[arg(long)]
        full: bool,

        /// Skip the result cache for this run
        #[arg(long)]
        no_cache: bool,
    },

    /// Profile two data files and diff the reports
    Compare {
        /// Baseline data file
        #[arg(value_name = "FILE1")]
        file1: PathBuf,

        /// Data file to compare against the baseline
        #[arg(value_name = "FILE2")]
        file2: PathBuf,

        /// Write the comparison as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the HTTP profiling server
    Serve {
        /// Port to listen on (default: PORT env var, then 5000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory for the result cache
        #[arg(long, default_value = ".strata-cache")]
        cache_dir: PathBuf,

        /// Disable the result cache
        #[arg(long)]
        no_cache: bool,
    },
}
