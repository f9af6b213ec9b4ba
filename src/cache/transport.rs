//! Tile transport abstraction
//!
//! The cache manager fetches tile bytes through the [`TileTransport`] trait so
//! tests can substitute a recording fake for the real HTTP client.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use crate::tiles::TileCoord;

/// Default public tile server (free OpenStreetMap base map tiles)
pub const DEFAULT_TILE_SERVER: &str = "https://tile.openstreetmap.org";

/// Default User-Agent; the OSM tile usage policy requires an identifying agent
pub const DEFAULT_USER_AGENT: &str = concat!("chartcache/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching a tile
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Fetches raw tile bytes from a URL
pub trait TileTransport {
    /// Performs a GET request and returns the body on a 2xx response
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// Builds the URL of a tile on a slippy-map server: `{base}/{z}/{x}/{y}.png`
pub fn tile_url(base: &str, tile: TileCoord) -> String {
    format!(
        "{}/{}/{}/{}.png",
        base.trim_end_matches('/'),
        tile.zoom,
        tile.x,
        tile.y
    )
}

/// Tile transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the default User-Agent and timeout
    pub fn new() -> Result<Self, TransportError> {
        Self::with_options(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }

    /// Creates a transport with a custom User-Agent and request timeout
    pub fn with_options(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self { client })
    }

    /// Creates a transport around an existing HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl TileTransport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
