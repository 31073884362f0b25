//! Artist-related models.

use serde::{Deserialize, Serialize};

use super::common::ExternalUrls;

/// Artist when nested inside a track.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArtistRef {
    /// Artist ID (absent for local files).
    #[serde(default)]
    pub id: Option<String>,

    /// Artist name.
    pub name: String,
}

/// A full artist record, as returned by search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Artist {
    /// Artist ID.
    pub id: String,

    /// Artist name.
    pub name: String,

    /// Genres associated with the artist.
    #[serde(default)]
    pub genres: Vec<String>,

    /// Popularity score (0-100).
    #[serde(default)]
    pub popularity: u32,

    /// External links.
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl Artist {
    /// Create a new artist with ID and name.
    pub fn new<S1: Into<String>, S2: Into<String>>(id: S1, name: S2) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Wrapper for `GET /search?type=artist`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ArtistSearch {
    #[serde(default)]
    pub artists: super::Page<Artist>,
}
