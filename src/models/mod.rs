//! Data models for Spotify Web API payloads.
//!
//! Only the fields the sync engine reads are modelled; everything else in
//! the responses is ignored by serde.

pub mod artist;
pub mod common;
pub mod export;
pub mod playlist;
pub mod track;

// Re-exports for convenience
pub use artist::{Artist, ArtistRef};
pub use common::{ExternalUrls, Page, User};
pub use export::ExportRecord;
pub use playlist::{Playlist, PlaylistItem, PlaylistOwner};
pub use track::{Track, TrackId};
