/*
newsart - single-binary main.rs
This binary runs one generation pass (headlines -> summaries -> images) in the background
and serves the generated images over HTTP from the same process.
*/

use anyhow::Result;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use newsart::server::launch_rocket;
use newsart::worker;

#[derive(Parser, Debug)]
#[command(name = "newsart", about = "Illustrate today's headlines and serve the pictures")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Do not run the generation pass (serve existing images only)
    #[arg(long, conflicts_with = "generate_only")]
    no_generate: bool,

    /// Run the generation pass and exit (do not bind HTTP server)
    #[arg(long)]
    generate_only: bool,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // API keys may live in a local .env file
    if let Ok(path) = dotenvy::dotenv() {
        info!(path = %path.display(), "loaded environment file");
    }

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = match Config::load_with_defaults(Some(default_path.as_path()), override_path.as_deref()).await {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override_path = ?override_path, "configuration loaded");

    if args.generate_only {
        info!("Starting in generate-only mode");
        run_generation_pass(&config).await;
        info!("generate-only run finished");
        return Ok(());
    }

    // The generation pass runs once alongside the server; the page shows whatever it has
    // stored so far.
    let mut generation = None;
    if !args.no_generate {
        info!("Spawning generation task");
        let g_cfg = config.clone();
        generation = Some(tokio::spawn(async move {
            run_generation_pass(&g_cfg).await;
        }));
    } else {
        info!("Generation disabled via CLI (--no-generate)");
    }

    if let Err(e) = launch_rocket(&config).await {
        error!(%e, "Rocket server failed");
    }

    // In-flight jobs are abandoned on shutdown.
    if let Some(handle) = generation {
        handle.abort();
    }

    info!("Shutdown complete");
    Ok(())
}

async fn run_generation_pass(config: &Config) {
    match worker::run_generation(config, |name| std::env::var(name).ok()).await {
        Ok(Some(report)) => info!(
            generated = report.generated.len(),
            failed = report.failed,
            "generation pass complete"
        ),
        Ok(None) => info!("generation pass skipped"),
        Err(e) => error!(error = %format!("{:#}", e), "generation pass aborted"),
    }
}
