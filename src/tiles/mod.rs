//! Tile addressing for offline regions
//!
//! Web Mercator conversion from latitude/longitude to tile indices, and the
//! region model whose tiles are enumerated for caching.

pub mod coord;
pub mod region;

pub use coord::{tile_x, tile_y, CoordError, TileCoord, MAX_LAT, MAX_ZOOM, MIN_LAT};
pub use region::{
    get_builtin_region, Region, RegionError, RegionTiles, ZoomRange, BUILTIN_REGIONS,
    DEFAULT_REGION_ID, LOUISIANA_COAST,
};
