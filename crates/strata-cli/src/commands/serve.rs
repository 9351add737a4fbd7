//! Serve command - start the HTTP profiling server.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use strata::cache::{ResultCache, SWEEP_INTERVAL};
use strata::{Engine, EngineConfig};

use crate::server::{app, state::AppState};

/// Default listen port when neither the flag nor PORT is set.
const DEFAULT_PORT: u16 = 5000;

pub fn run(
    port: Option<u16>,
    cache_dir: PathBuf,
    no_cache: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(verbose);

    let port = port
        .or_else(|| {
            std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
        })
        .unwrap_or(DEFAULT_PORT);

    let environment =
        std::env::var("STRATA_ENV").unwrap_or_else(|_| "development".to_string());

    let engine = Engine::with_config(EngineConfig {
        cache_dir: (!no_cache).then(|| cache_dir.clone()),
        ..EngineConfig::default()
    })?;

    // Hourly TTL sweep over the cache directory.
    if let Some(cache) = engine.cache() {
        ResultCache::spawn_sweeper(Arc::clone(cache), SWEEP_INTERVAL);
    }

    let state = AppState::new(engine, environment.clone());

    println!(
        "{} {}",
        "Starting strata server at".cyan().bold(),
        format!("http://localhost:{}", port).white().bold()
    );
    if no_cache {
        println!("  Cache: {}", "disabled".yellow());
    } else {
        println!("  Cache: {}", cache_dir.display());
    }
    println!("  Environment: {}", environment);
    println!();
    println!("Press {} to stop the server", "Ctrl+C".yellow().bold());
    println!();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        tokio::spawn(async {
            tokio::signal::ctrl_c().await.ok();
            println!();
            println!("{}", "Shutting down...".yellow());
            std::process::exit(0);
        });

        if let Err(e) = app::run_server(state, port).await {
            eprintln!("Server error: {}", e);
        }
    });

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose { "strata=debug,strata_cli=debug" } else { "strata=info,strata_cli=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
