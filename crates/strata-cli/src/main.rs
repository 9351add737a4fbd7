//! strata CLI - tabular-data profiling from the command line.

mod cli;
mod commands;
mod server;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            file,
            output,
            delimiter,
            full,
            no_cache,
        } => commands::analyze::run(file, output, delimiter, full, no_cache, cli.verbose),

        Commands::Compare {
            file1,
            file2,
            output,
        } => commands::compare::run(file1, file2, output, cli.verbose),

        Commands::Serve {
            port,
            cache_dir,
            no_cache,
        } => commands::serve::run(port, cache_dir, no_cache, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
