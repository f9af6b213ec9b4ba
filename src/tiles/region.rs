//! Offline regions and their tile enumeration
//!
//! A region is a named bounding box plus an inclusive zoom range. The tiles
//! covering it are produced by a single deterministic enumeration that is
//! used both to count tiles up front and to drive the download.

use std::borrow::Cow;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::coord::{tile_x, tile_y, CoordError, TileCoord};

/// Region used when none is specified
pub const DEFAULT_REGION_ID: &str = "louisiana-base";

/// Predefined Louisiana coastal region (rough bounds)
pub const LOUISIANA_COAST: Region = Region {
    id: Cow::Borrowed(DEFAULT_REGION_ID),
    name: Cow::Borrowed("Louisiana coast"),
    min_lat: 28.5,
    max_lat: 31.5,
    min_lon: -94.0,
    max_lon: -88.5,
    min_zoom: 6,
    max_zoom: 10,
};

/// All regions shipped with the crate
pub static BUILTIN_REGIONS: [Region; 1] = [LOUISIANA_COAST];

/// Errors raised by an invalid region definition
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    /// Region identifier is empty
    #[error("Region id must not be empty")]
    EmptyId,

    /// Minimum latitude is north of maximum latitude
    #[error("Region '{id}': min_lat {min} is greater than max_lat {max}")]
    LatitudeOrder { id: String, min: f64, max: f64 },

    /// Minimum longitude is east of maximum longitude
    #[error("Region '{id}': min_lon {min} is greater than max_lon {max}")]
    LongitudeOrder { id: String, min: f64, max: f64 },

    /// Minimum zoom is above maximum zoom
    #[error("Region '{id}': min_zoom {min} is greater than max_zoom {max}")]
    ZoomOrder { id: String, min: u8, max: u8 },

    /// A bound cannot be converted to a tile index
    #[error("Region '{id}': {source}")]
    Coordinate {
        id: String,
        #[source]
        source: CoordError,
    },
}

/// A geographic area to pre-cache for offline use
///
/// Uses `Cow<'static, str>` so predefined regions can be `const` while
/// regions loaded from the config file own their strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Unique identifier (e.g. "louisiana-base")
    pub id: Cow<'static, str>,
    /// Human-readable name
    pub name: Cow<'static, str>,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    /// Lowest zoom level to cache (inclusive)
    pub min_zoom: u8,
    /// Highest zoom level to cache (inclusive)
    pub max_zoom: u8,
}

/// The rectangle of tiles covering a region at one zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomRange {
    pub zoom: u8,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl ZoomRange {
    /// Number of tiles in this rectangle
    pub fn tile_count(&self) -> u64 {
        let width = (self.x_max - self.x_min) as u64 + 1;
        let height = (self.y_max - self.y_min) as u64 + 1;
        width * height
    }
}

impl Region {
    /// Returns the zoom levels covered by this region
    pub fn zooms(&self) -> RangeInclusive<u8> {
        self.min_zoom..=self.max_zoom
    }

    /// Checks that the region describes a non-empty, projectable area
    pub fn validate(&self) -> Result<(), RegionError> {
        if self.id.trim().is_empty() {
            return Err(RegionError::EmptyId);
        }
        if !(self.min_lat <= self.max_lat) {
            return Err(RegionError::LatitudeOrder {
                id: self.id.to_string(),
                min: self.min_lat,
                max: self.max_lat,
            });
        }
        if !(self.min_lon <= self.max_lon) {
            return Err(RegionError::LongitudeOrder {
                id: self.id.to_string(),
                min: self.min_lon,
                max: self.max_lon,
            });
        }
        if self.min_zoom > self.max_zoom {
            return Err(RegionError::ZoomOrder {
                id: self.id.to_string(),
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        // Converting the corners at the deepest zoom covers every range check
        self.zoom_range(self.max_zoom).map(|_| ())
    }

    /// Computes the tile rectangle covering this region at `zoom`
    ///
    /// The maximum latitude maps to the minimum row because rows increase
    /// southward.
    pub fn zoom_range(&self, zoom: u8) -> Result<ZoomRange, RegionError> {
        let coord_err = |source| RegionError::Coordinate {
            id: self.id.to_string(),
            source,
        };

        Ok(ZoomRange {
            zoom,
            x_min: tile_x(self.min_lon, zoom).map_err(coord_err)?,
            x_max: tile_x(self.max_lon, zoom).map_err(coord_err)?,
            y_min: tile_y(self.max_lat, zoom).map_err(coord_err)?,
            y_max: tile_y(self.min_lat, zoom).map_err(coord_err)?,
        })
    }

    /// Returns the per-zoom tile rectangles in ascending zoom order
    pub fn zoom_ranges(&self) -> Result<Vec<ZoomRange>, RegionError> {
        self.validate()?;
        self.zooms().map(|zoom| self.zoom_range(zoom)).collect()
    }

    /// Total number of tiles across all zoom levels
    pub fn tile_count(&self) -> Result<u64, RegionError> {
        Ok(self.zoom_ranges()?.iter().map(ZoomRange::tile_count).sum())
    }

    /// Enumerates every tile of the region
    ///
    /// Order is zoom ascending, then x ascending, then y ascending. The
    /// returned iterator is finite and can be cloned to restart it.
    pub fn tiles(&self) -> Result<RegionTiles, RegionError> {
        Ok(RegionTiles::new(self.zoom_ranges()?))
    }
}

/// Iterator over the tiles of a region in download order
#[derive(Debug, Clone)]
pub struct RegionTiles {
    ranges: Vec<ZoomRange>,
    range_index: usize,
    x: u32,
    y: u32,
    remaining: u64,
}

impl RegionTiles {
    fn new(ranges: Vec<ZoomRange>) -> Self {
        let remaining = ranges.iter().map(ZoomRange::tile_count).sum();
        let (x, y) = ranges
            .first()
            .map(|r| (r.x_min, r.y_min))
            .unwrap_or_default();
        Self {
            ranges,
            range_index: 0,
            x,
            y,
            remaining,
        }
    }
}

impl Iterator for RegionTiles {
    type Item = TileCoord;

    fn next(&mut self) -> Option<TileCoord> {
        let range = *self.ranges.get(self.range_index)?;
        let tile = TileCoord::new(range.zoom, self.x, self.y);

        if self.y < range.y_max {
            self.y += 1;
        } else if self.x < range.x_max {
            self.x += 1;
            self.y = range.y_min;
        } else {
            self.range_index += 1;
            if let Some(next) = self.ranges.get(self.range_index) {
                self.x = next.x_min;
                self.y = next.y_min;
            }
        }

        self.remaining -= 1;
        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RegionTiles {}

/// Looks up a builtin region by its identifier
pub fn get_builtin_region(id: &str) -> Option<&'static Region> {
    BUILTIN_REGIONS.iter().find(|region| region.id == id)
}
