//! Web Mercator tile math
//!
//! Converts latitude/longitude pairs into slippy-map tile indices. Indices are
//! always floored, never rounded, to match standard tile-server addressing.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest latitude representable by the Web Mercator projection
pub const MAX_LAT: f64 = 85.051_128_779_8;

/// Smallest latitude representable by the Web Mercator projection
pub const MIN_LAT: f64 = -MAX_LAT;

/// Highest zoom level accepted by the conversions
pub const MAX_ZOOM: u8 = 22;

/// Errors produced when a coordinate cannot be mapped onto a tile
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is outside the Mercator-representable range or not finite
    #[error("Latitude {0} is outside the Web Mercator range (±{max})", max = MAX_LAT)]
    InvalidLatitude(f64),

    /// Longitude is outside -180..=180 or not finite
    #[error("Longitude {0} is outside the range -180..=180")]
    InvalidLongitude(f64),

    /// Zoom level is above the supported maximum
    #[error("Zoom level {0} exceeds the maximum of {max}", max = MAX_ZOOM)]
    InvalidZoom(u8),
}

/// A Web Mercator tile address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub zoom: u8,
    /// Column, increasing eastward
    pub x: u32,
    /// Row, increasing southward
    pub y: u32,
}

impl TileCoord {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Returns the tile containing the given point
    pub fn from_lat_lon(lat: f64, lon: f64, zoom: u8) -> Result<Self, CoordError> {
        Ok(Self {
            zoom,
            x: tile_x(lon, zoom)?,
            y: tile_y(lat, zoom)?,
        })
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Number of tiles along one axis at the given zoom level
fn tiles_per_axis(zoom: u8) -> f64 {
    2.0_f64.powi(zoom as i32)
}

/// Floors a fractional tile index, clamping the far edge onto the last tile
fn to_index(value: f64, zoom: u8) -> u32 {
    let max_index = (1u64 << zoom) - 1;
    (value.floor().max(0.0) as u64).min(max_index) as u32
}

fn check_zoom(zoom: u8) -> Result<(), CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    Ok(())
}

/// Converts a longitude to a tile column
///
/// # Arguments
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 22)
///
/// # Returns
/// * `Ok(u32)` - The tile column, floored
/// * `Err(CoordError)` - If the longitude or zoom is out of range
pub fn tile_x(lon: f64, zoom: u8) -> Result<u32, CoordError> {
    check_zoom(zoom)?;
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }

    let x = (lon + 180.0) / 360.0 * tiles_per_axis(zoom);
    Ok(to_index(x, zoom))
}

/// Converts a latitude to a tile row
///
/// Rows increase southward, so the northern edge of a region maps to its
/// smallest row.
///
/// # Arguments
/// * `lat` - Latitude in degrees (-85.0511 to 85.0511)
/// * `zoom` - Zoom level (0 to 22)
///
/// # Returns
/// * `Ok(u32)` - The tile row, floored
/// * `Err(CoordError)` - If the latitude or zoom is out of range
pub fn tile_y(lat: f64, zoom: u8) -> Result<u32, CoordError> {
    check_zoom(zoom)?;
    if !lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }

    let lat_rad = lat * PI / 180.0;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * tiles_per_axis(zoom);
    Ok(to_index(y, zoom))
}
