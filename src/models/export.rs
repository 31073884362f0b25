//! Export records produced by a sync.

use serde::{Deserialize, Serialize};

/// One newly-added track, as written by the archiver.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportRecord {
    /// Lineup name of the artist the track was added for.
    pub artist: String,

    /// Track title.
    pub track: String,

    /// Catalog track ID.
    pub track_id: String,

    /// Web player URL.
    pub url: String,
}

impl ExportRecord {
    pub fn new<S1, S2, S3, S4>(artist: S1, track: S2, track_id: S3, url: S4) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
    {
        Self {
            artist: artist.into(),
            track: track.into(),
            track_id: track_id.into(),
            url: url.into(),
        }
    }
}
