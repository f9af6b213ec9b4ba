//! chartcache - Offline base maps for marine navigation
//!
//! Downloads the map tiles of a coastal region ahead of time so a chart
//! plotter can keep drawing its base map after losing signal.

use std::error::Error;
use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chartcache::cache::{HttpTransport, TileCache};
use chartcache::cli::{describe_region, format_bytes, resolve_region, Cli, Command};
use chartcache::config::Config;
use chartcache::ui::{LogProgress, TerminalProgress};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Loads the config file and applies command-line overrides
fn load_config(cli: &Cli) -> Result<Config, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli.apply_overrides(&mut config);
    debug!(?config, "Configuration loaded");
    Ok(config)
}

fn build_cache(config: &Config) -> Result<TileCache<HttpTransport>, Box<dyn Error>> {
    let transport = HttpTransport::with_options(&config.user_agent, config.timeout())?;
    Ok(TileCache::with_dir(config.tile_cache_dir()?, transport)
        .with_tile_server(config.tile_server.clone())
        .with_concurrency(config.concurrency))
}

async fn download(
    config: &Config,
    region_id: Option<&str>,
    quiet: bool,
) -> Result<ExitCode, Box<dyn Error>> {
    let region = resolve_region(config, region_id)?;
    let cache = build_cache(config)?;
    let total = region.tile_count()?;

    println!(
        "Downloading {} ({}): {} tiles into {}",
        region.name,
        describe_region(&region),
        total,
        cache.cache_dir().display()
    );

    let summary = if !quiet && io::stdout().is_terminal() {
        let mut progress = TerminalProgress::new(region.name.to_string())?;
        let result = cache.download_region(&region, &mut progress).await;
        progress.finish()?;
        result?
    } else {
        let mut progress = LogProgress::default();
        cache.download_region(&region, &mut progress).await?
    };

    println!(
        "Done: {} tiles fetched, {} already cached",
        summary.fetched, summary.skipped
    );
    Ok(ExitCode::SUCCESS)
}

fn clear(config: &Config) -> Result<ExitCode, Box<dyn Error>> {
    let cache = build_cache(config)?;
    cache.clear()?;
    println!("Cleared tile cache at {}", cache.cache_dir().display());
    Ok(ExitCode::SUCCESS)
}

fn lookup(config: &Config, zoom: u8, x: u32, y: u32) -> Result<ExitCode, Box<dyn Error>> {
    let cache = build_cache(config)?;
    match cache.cached_tile_path(zoom, x, y) {
        Some(path) => {
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("Tile {}/{}/{} is not cached", zoom, x, y);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn regions(config: &Config) -> Result<ExitCode, Box<dyn Error>> {
    for region in config.regions() {
        println!(
            "{:<20} {:<24} {:>8} tiles  {}",
            region.id,
            region.name,
            region.tile_count()?,
            describe_region(region)
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn status(config: &Config, region_id: Option<&str>) -> Result<ExitCode, Box<dyn Error>> {
    let cache = build_cache(config)?;
    let stats = cache.stats()?;

    println!("Cache directory: {}", cache.cache_dir().display());
    println!("Cached tiles:    {}", stats.tile_count);
    println!("Size on disk:    {}", format_bytes(stats.total_bytes));
    if let Some(newest) = stats.newest {
        println!("Last download:   {}", newest.format("%Y-%m-%d %H:%M"));
    }

    if let Some(id) = region_id {
        let region = resolve_region(config, Some(id))?;
        let coverage = cache.region_coverage(&region)?;
        println!(
            "{}: {}/{} tiles cached{}",
            region.name,
            coverage.cached,
            coverage.total,
            if coverage.is_complete() { " (complete)" } else { "" }
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let config = load_config(&cli)?;

    match &cli.command {
        Command::Download { region, quiet, .. } => {
            download(&config, region.as_deref(), *quiet).await
        }
        Command::Clear => clear(&config),
        Command::Lookup { zoom, x, y } => lookup(&config, *zoom, *x, *y),
        Command::Regions => regions(&config),
        Command::Status { region } => status(&config, region.as_deref()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    info!(command = ?cli.command, "chartcache starting");

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
