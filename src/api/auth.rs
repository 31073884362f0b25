//! Credential provider.
//!
//! Resolves an access token for the Web API without any user interaction:
//!
//! 1. `SPOTIFY_ACCESS_TOKEN`, if set, is used as-is.
//! 2. Otherwise the token cache (spotipy's `.cache-spotify` format) is read
//!    and used while it is still valid.
//! 3. Otherwise the refresh token from the cache or `SPOTIFY_REFRESH_TOKEN`
//!    is exchanged for a new access token, which is written back to the
//!    cache.
//!
//! The browser authorization-code flow is not handled here; a refresh token
//! has to be obtained once out of band.

use std::path::{Path, PathBuf};

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::SpotifyApi;
use crate::config::{Settings, SPOTIFY_REDIRECT_URI, SPOTIFY_SCOPES};
use crate::error::{FestifyError, Result};

/// Accounts service token endpoint.
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

const ENV_CLIENT_ID: &str = "SPOTIPY_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "SPOTIPY_CLIENT_SECRET";
const ENV_REDIRECT_URI: &str = "SPOTIPY_REDIRECT_URI";
const ENV_ACCESS_TOKEN: &str = "SPOTIFY_ACCESS_TOKEN";
const ENV_REFRESH_TOKEN: &str = "SPOTIFY_REFRESH_TOKEN";

/// OAuth application credentials.
#[derive(Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl std::fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

impl SpotifyCredentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let client_id = get(ENV_CLIENT_ID);
        let client_secret = get(ENV_CLIENT_SECRET);

        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(Self {
                client_id,
                client_secret,
                redirect_uri: get(ENV_REDIRECT_URI)
                    .unwrap_or_else(|| SPOTIFY_REDIRECT_URI.to_string()),
            }),
            _ => Err(FestifyError::Configuration(format!(
                "Spotify credentials not configured: set {} and {}",
                ENV_CLIENT_ID, ENV_CLIENT_SECRET
            ))),
        }
    }
}

/// Token as stored in the cache file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenInfo {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
    /// Expiry as a Unix timestamp.
    #[serde(default)]
    pub expires_at: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenInfo {
    /// Whether the token is expired (or about to be) at `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now + EXPIRY_MARGIN_SECS >= self.expires_at
    }

    /// Whether the token is expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Whether the granted scopes cover everything we need.
    ///
    /// Tokens without scope information are assumed to be sufficient.
    pub fn has_required_scopes(&self) -> bool {
        match &self.scope {
            Some(scope) => {
                let granted: Vec<&str> = scope.split_whitespace().collect();
                SPOTIFY_SCOPES.iter().all(|s| granted.contains(s))
            }
            None => true,
        }
    }
}

/// File-backed token cache.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the cached token. A missing or unreadable cache yields `None`.
    pub fn load(&self) -> Option<TokenInfo> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => {
                debug!("No token cache at {}", self.path.display());
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Ignoring corrupt token cache {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Write the token to the cache file.
    pub fn save(&self, token: &TokenInfo) -> Result<()> {
        let json = serde_json::to_string(token)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Exchange a refresh token for a new access token.
pub async fn refresh_access_token(
    client: &Client,
    credentials: &SpotifyCredentials,
    refresh_token: &str,
) -> Result<TokenInfo> {
    let params = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
    ];

    let response = client
        .post(TOKEN_URL)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&params)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FestifyError::Configuration(format!(
            "Failed to refresh Spotify token ({}): {}",
            status, body
        )));
    }

    let mut token: TokenInfo = response.json().await?;
    token.expires_at = Utc::now().timestamp() + token.expires_in;
    // The accounts service only sometimes rotates the refresh token.
    if token.refresh_token.is_none() {
        token.refresh_token = Some(refresh_token.to_string());
    }
    Ok(token)
}

/// Build an authenticated [`SpotifyApi`].
///
/// Fails with [`FestifyError::Configuration`] before any Web API call when
/// no usable credentials are available.
pub async fn authenticate(settings: &Settings) -> Result<SpotifyApi> {
    if let Some(token) = std::env::var(ENV_ACCESS_TOKEN)
        .ok()
        .filter(|t| !t.trim().is_empty())
    {
        info!("Using access token from {}", ENV_ACCESS_TOKEN);
        return SpotifyApi::new(settings, token);
    }

    let credentials = SpotifyCredentials::from_env()?;
    let cache = TokenCache::new(&settings.token_cache);
    let cached = cache.load();

    if let Some(token) = cached.as_ref().filter(|t| !t.is_expired()) {
        if !token.has_required_scopes() {
            warn!(
                "Cached token lacks scopes {:?}; playlist changes may be rejected",
                SPOTIFY_SCOPES
            );
        }
        debug!("Using cached access token");
        return SpotifyApi::new(settings, token.access_token.clone());
    }

    let refresh_token = cached
        .and_then(|t| t.refresh_token)
        .or_else(|| std::env::var(ENV_REFRESH_TOKEN).ok())
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            FestifyError::Configuration(format!(
                "No valid token in {} and {} is not set; authorize the app once (redirect URI {}) and export the refresh token",
                settings.token_cache.display(),
                ENV_REFRESH_TOKEN,
                credentials.redirect_uri
            ))
        })?;

    let client = Client::builder()
        .timeout(settings.request_timeout())
        .build()
        .map_err(|e| FestifyError::Configuration(format!("Failed to create client: {}", e)))?;

    let token = refresh_access_token(&client, &credentials, &refresh_token).await?;
    if let Err(e) = cache.save(&token) {
        warn!("Could not update token cache {}: {}", settings.token_cache.display(), e);
    }
    info!("Refreshed Spotify access token");

    SpotifyApi::new(settings, token.access_token)
}
