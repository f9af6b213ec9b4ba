//! Tile cache manager for offline base maps
//!
//! Provides a `TileCache` that downloads every tile of a region to disk,
//! skipping tiles that are already present, and supports lookup and clearing.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::pin::pin;

use chrono::{DateTime, Local};
use directories::ProjectDirs;
use futures::stream::{self, StreamExt};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::transport::{tile_url, TileTransport, TransportError, DEFAULT_TILE_SERVER};
use crate::tiles::{Region, RegionError, TileCoord};

/// File extension of cached tiles
const TILE_EXTENSION: &str = "png";

/// Errors that abort a cache operation
#[derive(Debug, Error)]
pub enum TileCacheError {
    /// A tile could not be fetched from the tile server
    #[error("Failed to fetch tile {tile}: {source}")]
    Transport {
        tile: TileCoord,
        #[source]
        source: TransportError,
    },

    /// A directory or file operation failed
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The requested region is not valid
    #[error(transparent)]
    Region(#[from] RegionError),
}

/// Progress of a running region download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadProgress {
    /// Tiles processed so far, whether fetched or already cached
    pub downloaded: u64,
    /// Tiles in the region
    pub total: u64,
    /// Tiles fetched from the server so far
    pub fetched: u64,
    /// Tiles skipped because they were already cached
    pub skipped: u64,
}

impl DownloadProgress {
    /// Fraction of the region processed, in 0.0..=1.0
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.downloaded as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}

/// Receives progress updates during a region download
///
/// Called synchronously, once per tile, in tile order. Implementations should
/// return quickly since the download waits on them.
pub trait ProgressObserver {
    fn on_progress(&mut self, progress: DownloadProgress);
}

impl<F: FnMut(DownloadProgress)> ProgressObserver for F {
    fn on_progress(&mut self, progress: DownloadProgress) {
        self(progress)
    }
}

/// Observer that ignores all progress updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _progress: DownloadProgress) {}
}

/// Outcome of a completed region download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSummary {
    pub total: u64,
    pub fetched: u64,
    pub skipped: u64,
}

/// How much of a region is already on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionCoverage {
    pub cached: u64,
    pub total: u64,
}

impl RegionCoverage {
    pub fn is_complete(&self) -> bool {
        self.cached == self.total
    }
}

/// Summary of the tiles currently on disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Number of cached tile files
    pub tile_count: u64,
    /// Combined size of all cached tiles in bytes
    pub total_bytes: u64,
    /// Modification time of the most recently written tile
    pub newest: Option<DateTime<Local>>,
}

/// Result of resolving a single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TileOutcome {
    Fetched,
    Skipped,
}

fn storage_error(path: &Path) -> impl FnOnce(io::Error) -> TileCacheError + '_ {
    move |source| TileCacheError::Storage {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes tile bytes so that the final path only ever holds a complete tile
fn write_tile(path: &Path, bytes: &[u8]) -> Result<(), TileCacheError> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(storage_error(dir))?;
    file.write_all(bytes).map_err(storage_error(path))?;
    file.persist(path).map_err(|e| storage_error(path)(e.error))?;
    Ok(())
}

/// Default tile directory: `{XDG cache}/chartcache/tiles/osm`
pub fn default_cache_dir() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "chartcache")?;
    Some(project_dirs.cache_dir().join("tiles").join("osm"))
}

/// Manages the on-disk tile cache
///
/// Tiles are stored as `{cache_dir}/{z}/{x}/{y}.png`; the presence of that
/// file is the only record that a tile is cached. On Linux the default
/// location is `~/.cache/chartcache/tiles/osm/`.
#[derive(Debug, Clone)]
pub struct TileCache<T> {
    /// Root directory of the tile tree
    cache_dir: PathBuf,
    /// Base URL of the slippy-map tile server
    tile_server: String,
    /// Maximum number of tiles resolved at once
    concurrency: usize,
    transport: T,
}

impl<T: TileTransport> TileCache<T> {
    /// Creates a TileCache in the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new(transport: T) -> Option<Self> {
        Some(Self::with_dir(default_cache_dir()?, transport))
    }

    /// Creates a TileCache rooted at a custom directory
    pub fn with_dir(cache_dir: PathBuf, transport: T) -> Self {
        Self {
            cache_dir,
            tile_server: DEFAULT_TILE_SERVER.to_string(),
            concurrency: 1,
            transport,
        }
    }

    /// Uses a different tile server base URL
    pub fn with_tile_server(mut self, tile_server: impl Into<String>) -> Self {
        self.tile_server = tile_server.into();
        self
    }

    /// Allows up to `concurrency` tiles to be resolved at once (minimum 1)
    ///
    /// Progress is still reported in tile order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn tile_server(&self) -> &str {
        &self.tile_server
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the path a tile is stored at, whether or not it exists
    pub fn tile_path(&self, tile: TileCoord) -> PathBuf {
        self.cache_dir
            .join(tile.zoom.to_string())
            .join(tile.x.to_string())
            .join(format!("{}.{}", tile.y, TILE_EXTENSION))
    }

    /// Ensures the given directory exists; existing directories are fine
    fn ensure_dir(dir: &Path) -> Result<(), TileCacheError> {
        fs::create_dir_all(dir).map_err(storage_error(dir))
    }

    /// Fetches a tile unless it is already cached
    async fn resolve_tile(&self, tile: TileCoord) -> Result<TileOutcome, TileCacheError> {
        let path = self.tile_path(tile);
        if tokio::fs::try_exists(&path)
            .await
            .map_err(storage_error(&path))?
        {
            debug!(%tile, "Tile already cached");
            return Ok(TileOutcome::Skipped);
        }

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(storage_error(dir))?;
        }

        let url = tile_url(&self.tile_server, tile);
        let bytes = self
            .transport
            .fetch(&url)
            .await
            .map_err(|source| TileCacheError::Transport { tile, source })?;

        let len = bytes.len();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_tile(&target, &bytes))
            .await
            .map_err(|e| storage_error(&path)(e.into()))??;
        debug!(%tile, bytes = len, "Tile cached");
        Ok(TileOutcome::Fetched)
    }

    /// Downloads every tile of `region` that is not already cached
    ///
    /// The region's tiles are counted first, then resolved in zoom, x, y
    /// order. `observer` is called after every tile with the running count.
    /// The first transport or storage failure aborts the download; tiles
    /// written before it stay cached, so calling this again resumes where it
    /// stopped.
    ///
    /// # Returns
    /// * `Ok(DownloadSummary)` once every tile is cached
    /// * `Err(TileCacheError)` on an invalid region or the first failed tile
    pub async fn download_region<O>(
        &self,
        region: &Region,
        observer: &mut O,
    ) -> Result<DownloadSummary, TileCacheError>
    where
        O: ProgressObserver + ?Sized,
    {
        let tiles = region.tiles()?;
        let total = tiles.len() as u64;
        info!(
            region = %region.id,
            total,
            concurrency = self.concurrency,
            "Starting region download"
        );

        Self::ensure_dir(&self.cache_dir)?;

        let mut results = pin!(stream::iter(tiles)
            .map(|tile| self.resolve_tile(tile))
            .buffered(self.concurrency));

        let mut progress = DownloadProgress {
            total,
            ..Default::default()
        };

        while let Some(outcome) = results.next().await {
            match outcome {
                Ok(TileOutcome::Fetched) => progress.fetched += 1,
                Ok(TileOutcome::Skipped) => progress.skipped += 1,
                Err(e) => {
                    warn!(
                        region = %region.id,
                        downloaded = progress.downloaded,
                        total,
                        error = %e,
                        "Region download aborted"
                    );
                    return Err(e);
                }
            }
            progress.downloaded += 1;
            observer.on_progress(progress);
        }

        info!(
            region = %region.id,
            fetched = progress.fetched,
            skipped = progress.skipped,
            "Region download complete"
        );

        Ok(DownloadSummary {
            total,
            fetched: progress.fetched,
            skipped: progress.skipped,
        })
    }

    /// Deletes the whole tile tree
    ///
    /// Succeeds if the cache directory does not exist.
    pub fn clear(&self) -> Result<(), TileCacheError> {
        match fs::remove_dir_all(&self.cache_dir) {
            Ok(()) => {
                info!(dir = %self.cache_dir.display(), "Tile cache cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(&self.cache_dir)(e)),
        }
    }

    /// Returns the local path of a cached tile, or `None` if it is not cached
    pub fn cached_tile_path(&self, zoom: u8, x: u32, y: u32) -> Option<PathBuf> {
        let path = self.tile_path(TileCoord::new(zoom, x, y));
        path.exists().then_some(path)
    }

    /// Counts how many of a region's tiles are already cached
    pub fn region_coverage(&self, region: &Region) -> Result<RegionCoverage, RegionError> {
        let tiles = region.tiles()?;
        let total = tiles.len() as u64;
        let cached = tiles.filter(|tile| self.tile_path(*tile).exists()).count() as u64;
        Ok(RegionCoverage { cached, total })
    }

    /// Walks the tile tree and summarises what is on disk
    ///
    /// A missing cache directory yields empty statistics.
    pub fn stats(&self) -> Result<CacheStats, TileCacheError> {
        let mut stats = CacheStats::default();
        let mut pending = vec![self.cache_dir.clone()];

        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(storage_error(&dir)(e)),
            };

            for entry in entries {
                let entry = entry.map_err(storage_error(&dir))?;
                let path = entry.path();
                let metadata = entry.metadata().map_err(storage_error(&path))?;

                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }
                if path.extension().and_then(|ext| ext.to_str()) != Some(TILE_EXTENSION) {
                    continue;
                }

                stats.tile_count += 1;
                stats.total_bytes += metadata.len();
                if let Ok(modified) = metadata.modified() {
                    let modified = DateTime::<Local>::from(modified);
                    if stats.newest.map_or(true, |newest| modified > newest) {
                        stats.newest = Some(modified);
                    }
                }
            }
        }

        Ok(stats)
    }
}
