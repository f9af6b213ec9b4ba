//! Cache module for storing map tiles to disk
//!
//! This module provides a tile cache that downloads every tile of an offline
//! region from a slippy-map tile server, skipping tiles that are already on
//! disk so an interrupted download can simply be run again.

mod manager;
pub mod transport;

pub use manager::{
    default_cache_dir, CacheStats, DownloadProgress, DownloadSummary, NoProgress,
    ProgressObserver, RegionCoverage, TileCache, TileCacheError,
};
pub use transport::{tile_url, HttpTransport, TileTransport, TransportError};
