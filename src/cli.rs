//! Command-line interface parsing for chartcache
//!
//! This module handles parsing of CLI arguments using clap, resolving region
//! identifiers against the builtin and configured regions, and applying
//! command-line overrides on top of the config file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::config::Config;
use crate::tiles::{Region, DEFAULT_REGION_ID};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified region identifier is not known
    #[error("Unknown region: '{id}'. Valid regions: {valid}")]
    UnknownRegion { id: String, valid: String },
}

/// chartcache - Download and manage offline base-map tiles
#[derive(Parser, Debug)]
#[command(name = "chartcache")]
#[command(about = "Offline base-map tile cache for marine navigation")]
#[command(version)]
pub struct Cli {
    /// Path to the config file (defaults to the XDG config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Tile cache directory, overriding the config file
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Download every tile of a region that is not cached yet
    ///
    /// Safe to re-run after a failure: tiles already on disk are skipped.
    ///
    /// Examples:
    ///   chartcache download                  # Louisiana coast
    ///   chartcache download mobile-bay -c 4  # configured region, 4 tiles at once
    Download {
        /// Region identifier (see `chartcache regions`)
        #[arg(value_name = "REGION")]
        region: Option<String>,

        /// Number of tiles fetched at once
        #[arg(long, short = 'c', value_name = "N")]
        concurrency: Option<usize>,

        /// Log progress instead of drawing a progress bar
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Delete every cached tile
    Clear,

    /// Print the local path of a cached tile
    Lookup {
        /// Zoom level
        zoom: u8,
        /// Tile column
        x: u32,
        /// Tile row
        y: u32,
    },

    /// List the known regions and their tile counts
    Regions,

    /// Show what is in the cache, optionally with a region's coverage
    Status {
        /// Region identifier to report coverage for
        #[arg(value_name = "REGION")]
        region: Option<String>,
    },
}

impl Cli {
    /// Applies command-line overrides on top of the loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = Some(dir.clone());
        }
        if let Command::Download {
            concurrency: Some(concurrency),
            ..
        } = &self.command
        {
            config.concurrency = *concurrency;
        }
    }
}

/// Resolves a region argument, defaulting to the Louisiana coast
///
/// # Returns
/// * `Ok(Region)` if the id matches a builtin or configured region
/// * `Err(CliError::UnknownRegion)` listing the valid ids otherwise
pub fn resolve_region(config: &Config, id: Option<&str>) -> Result<Region, CliError> {
    let id = id.unwrap_or(DEFAULT_REGION_ID);
    config.find_region(id).cloned().ok_or_else(|| {
        let valid: Vec<_> = config.regions().map(|region| &*region.id).collect();
        CliError::UnknownRegion {
            id: id.to_string(),
            valid: valid.join(", "),
        }
    })
}

/// Formats a byte count with a binary unit suffix
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.1} {}", value, unit)
}

/// One-line description of a region's extent
pub fn describe_region(region: &Region) -> String {
    format!(
        "lat {}..{}, lon {}..{}, zoom {}-{}",
        region.min_lat,
        region.max_lat,
        region.min_lon,
        region.max_lon,
        region.min_zoom,
        region.max_zoom
    )
}
