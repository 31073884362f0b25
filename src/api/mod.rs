//! Remote catalog access.
//!
//! [`CatalogClient`] is the seam between the sync engine and the streaming
//! service. [`SpotifyApi`] is the Web API implementation; [`auth`] turns
//! credentials into an authenticated [`SpotifyApi`].

pub mod auth;
pub mod spotify;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Artist, Page, Playlist, PlaylistItem, Track, TrackId};

pub use spotify::SpotifyApi;

/// The catalog operations the sync engine needs.
///
/// Every method is a single remote call; pagination and chunking are the
/// caller's job.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// ID of the authenticated user.
    async fn current_user_id(&self) -> Result<String>;

    /// Search artists by name, best match first.
    async fn search_artists(&self, name: &str, limit: u32) -> Result<Vec<Artist>>;

    /// An artist's top tracks in the catalog's popularity order.
    async fn artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>>;

    /// Full track metadata.
    async fn track(&self, track_id: &str) -> Result<Track>;

    /// One page of the authenticated user's playlists.
    async fn current_user_playlists(&self, limit: u32, offset: u32) -> Result<Page<Playlist>>;

    /// Create a private playlist.
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Playlist>;

    /// Replace a playlist's description.
    async fn set_playlist_description(&self, playlist_id: &str, description: &str) -> Result<()>;

    /// One page of a playlist's items.
    async fn playlist_items(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>>;

    /// Append tracks to a playlist. At most 100 IDs per call.
    async fn add_playlist_items(&self, playlist_id: &str, track_ids: &[TrackId]) -> Result<()>;

    /// Unfollow (delete) a playlist.
    async fn unfollow_playlist(&self, playlist_id: &str) -> Result<()>;
}
