//! Runtime settings.
//!
//! Defaults can be overridden by an optional TOML file and then by CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default number of top tracks fetched per artist.
pub const DEFAULT_TOP_N: usize = 5;

/// Default size of the per-artist worker pool.
pub const DEFAULT_WORKERS: usize = 2;

/// Prefix shared by every generated playlist title.
pub const DEFAULT_PLAYLIST_PREFIX: &str = "Festify";

/// OAuth scopes the token must carry.
pub const SPOTIFY_SCOPES: &[&str] = &["playlist-modify-public", "playlist-modify-private"];

/// Default OAuth redirect URI.
pub const SPOTIFY_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";

/// Base URL for the Spotify Web API.
pub const API_BASE_URL: &str = "https://api.spotify.com/v1/";

/// Festify settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Top tracks fetched per artist.
    pub top_n: usize,
    /// Concurrent per-artist workers. `1` processes the lineup in order.
    pub workers: usize,
    /// Market used for top-track lookups.
    pub market: String,
    /// Root of the lineup files (`{data_dir}/{festival}/{year}/`).
    pub data_dir: PathBuf,
    /// Root of the playlist exports.
    pub playlist_dir: PathBuf,
    /// Directory for `app.log`. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// Title prefix of generated playlists; also the cleanup prefix.
    pub playlist_prefix: String,
    /// Token cache file in spotipy's format.
    pub token_cache: PathBuf,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Retries for transient API failures.
    pub max_retries: usize,
    /// Client-side request rate limit.
    pub requests_per_second: Option<u32>,
    /// Web API base URL.
    pub api_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            workers: DEFAULT_WORKERS,
            market: "US".to_string(),
            data_dir: PathBuf::from("res/lineups"),
            playlist_dir: PathBuf::from("res/playlists"),
            log_dir: Some(PathBuf::from("logs")),
            playlist_prefix: DEFAULT_PLAYLIST_PREFIX.to_string(),
            token_cache: PathBuf::from(".cache-spotify"),
            request_timeout_secs: 10,
            max_retries: 3,
            requests_per_second: None,
            api_base_url: API_BASE_URL.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Worker count clamped to at least one.
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}
