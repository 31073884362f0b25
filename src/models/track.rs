//! Track-related models.

use serde::{Deserialize, Serialize};

use super::artist::ArtistRef;
use super::common::ExternalUrls;

/// Opaque catalog track ID.
pub type TrackId = String;

/// Base URL for opening a track in the web player.
const OPEN_TRACK_URL: &str = "https://open.spotify.com/track/";

/// A catalog track.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Track {
    /// Track ID. `None` for local files added to a playlist.
    #[serde(default)]
    pub id: Option<TrackId>,

    /// Track title.
    #[serde(default)]
    pub name: String,

    /// Artists who performed this track.
    #[serde(default)]
    pub artists: Vec<ArtistRef>,

    /// Duration in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,

    /// External links.
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl Track {
    /// Create a new track with ID and name.
    pub fn new<S1: Into<String>, S2: Into<String>>(id: S1, name: S2) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Web player URL, falling back to the canonical one built from the ID.
    pub fn url(&self) -> Option<String> {
        self.external_urls
            .spotify
            .clone()
            .or_else(|| self.id.as_deref().map(track_url))
    }
}

/// Canonical web player URL for a track ID.
pub fn track_url(id: &str) -> String {
    format!("{}{}", OPEN_TRACK_URL, id)
}

/// URI form expected by the playlist mutation endpoint.
pub fn track_uri(id: &str) -> String {
    format!("spotify:track:{}", id)
}

/// Wrapper for `GET /artists/{id}/top-tracks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TopTracks {
    #[serde(default)]
    pub tracks: Vec<Track>,
}
