//! Playlist-related models.

use serde::{Deserialize, Serialize};

use super::common::ExternalUrls;
use super::track::Track;

/// Owner of a playlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaylistOwner {
    /// User ID of the owner.
    pub id: String,

    /// Display name of the owner.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A user playlist.
///
/// Names are not unique across owners; lookups must match on
/// `(name, owner.id)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Playlist {
    /// Playlist ID.
    pub id: String,

    /// Playlist title.
    pub name: String,

    /// Playlist owner.
    pub owner: PlaylistOwner,

    /// Playlist description. Spotify returns `null` or `""` when unset.
    #[serde(default)]
    pub description: Option<String>,

    /// External links.
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl Playlist {
    /// Create a new playlist record.
    pub fn new<S1, S2, S3>(id: S1, name: S2, owner_id: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            owner: PlaylistOwner {
                id: owner_id.into(),
                display_name: None,
            },
            ..Default::default()
        }
    }

    /// Whether this playlist is owned by `owner_id`.
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner.id == owner_id
    }

    /// Description text, empty when unset.
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// An entry of a playlist's track listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaylistItem {
    /// The referenced track; `null` for removed or unavailable items.
    #[serde(default)]
    pub track: Option<Track>,
}

impl PlaylistItem {
    /// Track ID if the item references a catalog track.
    pub fn track_id(&self) -> Option<&str> {
        self.track.as_ref().and_then(|t| t.id.as_deref())
    }
}
