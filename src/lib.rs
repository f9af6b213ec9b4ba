//! chartcache library
//!
//! Offline base-map tile caching: Web Mercator tile math, region enumeration,
//! and a disk cache that downloads, looks up and clears tiles. The modules are
//! exposed for the CLI binary and for integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod tiles;
pub mod ui;
