//! In-memory [`CatalogClient`] for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::CatalogClient;
use crate::error::{FestifyError, Result};
use crate::models::{Artist, Page, Playlist, PlaylistItem, Track, TrackId};

#[derive(Debug, Default)]
struct CatalogState {
    user_id: String,
    artists: Vec<Artist>,
    top_tracks: HashMap<String, Vec<TrackId>>,
    playlists: Vec<Playlist>,
    items: HashMap<String, Vec<TrackId>>,
    next_playlist: usize,

    failing_search: HashSet<String>,
    failing_adds: HashSet<TrackId>,
    failing_metadata: HashSet<TrackId>,
    failing_unfollow: HashSet<String>,

    item_page_requests: usize,
    playlist_page_requests: usize,
    add_calls: Vec<Vec<TrackId>>,
    created: Vec<String>,
    descriptions_set: Vec<(String, String)>,
}

fn not_found(what: &str) -> FestifyError {
    FestifyError::Api {
        status: 404,
        message: format!("{} not found", what),
    }
}

/// Catalog and playlists held in memory, with call recording and failure
/// injection.
type SearchHook = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
pub(crate) struct MemoryCatalog {
    state: Mutex<CatalogState>,
    search_hook: Option<SearchHook>,
}

impl MemoryCatalog {
    pub fn new(user_id: &str) -> Self {
        let catalog = Self::default();
        catalog.state().user_id = user_id.to_string();
        catalog
    }

    fn state(&self) -> std::sync::MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap()
    }

    /// Add an artist whose top tracks are `tracks`, in popularity order.
    pub fn with_artist(self, name: &str, id: &str, tracks: &[&str]) -> Self {
        {
            let mut state = self.state();
            state.artists.push(Artist::new(id, name));
            state
                .top_tracks
                .insert(id.to_string(), tracks.iter().map(|t| t.to_string()).collect());
        }
        self
    }

    /// Add a playlist followed by the current user.
    pub fn with_playlist(self, id: &str, name: &str, owner: &str, tracks: &[&str]) -> Self {
        {
            let mut state = self.state();
            state.playlists.push(Playlist::new(id, name, owner));
            state
                .items
                .insert(id.to_string(), tracks.iter().map(|t| t.to_string()).collect());
        }
        self
    }

    /// Add `count` generated playlists (`{prefix}{n}`) owned by `owner`.
    pub fn with_playlists(self, prefix: &str, owner: &str, count: usize) -> Self {
        (0..count).fold(self, |catalog, n| {
            catalog.with_playlist(&format!("gen{}", n), &format!("{}{}", prefix, n), owner, &[])
        })
    }

    /// Call `hook` with the artist name at the start of every search.
    pub fn on_search(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.search_hook = Some(Box::new(hook));
        self
    }

    pub fn fail_search_for(self, name: &str) -> Self {
        self.state().failing_search.insert(name.to_lowercase());
        self
    }

    /// Any add call containing `track_id` fails.
    pub fn fail_adds_containing(self, track_id: &str) -> Self {
        self.state().failing_adds.insert(track_id.to_string());
        self
    }

    pub fn fail_metadata_for(self, track_id: &str) -> Self {
        self.state().failing_metadata.insert(track_id.to_string());
        self
    }

    pub fn fail_unfollow_for(self, playlist_id: &str) -> Self {
        self.state().failing_unfollow.insert(playlist_id.to_string());
        self
    }

    pub fn playlist_tracks(&self, playlist_id: &str) -> Vec<TrackId> {
        self.state().items.get(playlist_id).cloned().unwrap_or_default()
    }

    pub fn playlist_names(&self) -> Vec<String> {
        self.state().playlists.iter().map(|p| p.name.clone()).collect()
    }

    pub fn description_of(&self, playlist_id: &str) -> Option<String> {
        self.state()
            .playlists
            .iter()
            .find(|p| p.id == playlist_id)
            .and_then(|p| p.description.clone())
    }

    pub fn item_page_requests(&self) -> usize {
        self.state().item_page_requests
    }

    pub fn playlist_page_requests(&self) -> usize {
        self.state().playlist_page_requests
    }

    pub fn add_calls(&self) -> Vec<Vec<TrackId>> {
        self.state().add_calls.clone()
    }

    pub fn created(&self) -> Vec<String> {
        self.state().created.clone()
    }

    pub fn descriptions_set(&self) -> Vec<(String, String)> {
        self.state().descriptions_set.clone()
    }

    pub fn reset_counters(&self) {
        let mut state = self.state();
        state.item_page_requests = 0;
        state.playlist_page_requests = 0;
        state.add_calls.clear();
        state.created.clear();
        state.descriptions_set.clear();
    }
}

fn page_of<T: Clone>(all: &[T], limit: u32, offset: u32) -> Page<T> {
    let items = all
        .iter()
        .skip(offset as usize)
        .take(limit as usize)
        .cloned()
        .collect();
    Page::new(items, limit, offset, all.len() as u32)
}

#[async_trait]
impl CatalogClient for MemoryCatalog {
    async fn current_user_id(&self) -> Result<String> {
        Ok(self.state().user_id.clone())
    }

    async fn search_artists(&self, name: &str, limit: u32) -> Result<Vec<Artist>> {
        if let Some(hook) = &self.search_hook {
            hook(name);
        }
        tokio::task::yield_now().await;
        let state = self.state();
        if state.failing_search.contains(&name.to_lowercase()) {
            return Err(FestifyError::Api {
                status: 500,
                message: "search unavailable".into(),
            });
        }
        Ok(state
            .artists
            .iter()
            .filter(|a| a.name.eq_ignore_ascii_case(name))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>> {
        tokio::task::yield_now().await;
        let state = self.state();
        let ids = state
            .top_tracks
            .get(artist_id)
            .ok_or_else(|| not_found(artist_id))?;
        Ok(ids
            .iter()
            .map(|id| Track::new(id.as_str(), format!("Track {}", id)))
            .collect())
    }

    async fn track(&self, track_id: &str) -> Result<Track> {
        if self.state().failing_metadata.contains(track_id) {
            return Err(not_found(track_id));
        }
        Ok(Track::new(track_id, format!("Track {}", track_id)))
    }

    async fn current_user_playlists(&self, limit: u32, offset: u32) -> Result<Page<Playlist>> {
        let mut state = self.state();
        state.playlist_page_requests += 1;
        Ok(page_of(&state.playlists, limit, offset))
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Playlist> {
        let mut state = self.state();
        state.next_playlist += 1;
        let mut playlist = Playlist::new(format!("new{}", state.next_playlist), name, user_id);
        playlist.description = Some(description.to_string());
        state.playlists.push(playlist.clone());
        state.items.insert(playlist.id.clone(), Vec::new());
        state.created.push(name.to_string());
        Ok(playlist)
    }

    async fn set_playlist_description(&self, playlist_id: &str, description: &str) -> Result<()> {
        let mut state = self.state();
        let playlist = state
            .playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .ok_or_else(|| not_found(playlist_id))?;
        playlist.description = Some(description.to_string());
        state
            .descriptions_set
            .push((playlist_id.to_string(), description.to_string()));
        Ok(())
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>> {
        let mut state = self.state();
        state.item_page_requests += 1;
        let ids = state
            .items
            .get(playlist_id)
            .ok_or_else(|| not_found(playlist_id))?;
        let items: Vec<PlaylistItem> = ids
            .iter()
            .map(|id| PlaylistItem {
                track: Some(Track::new(id.as_str(), "")),
            })
            .collect();
        Ok(page_of(&items, limit, offset))
    }

    async fn add_playlist_items(&self, playlist_id: &str, track_ids: &[TrackId]) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.state();
        state.add_calls.push(track_ids.to_vec());
        if track_ids.iter().any(|id| state.failing_adds.contains(id)) {
            return Err(FestifyError::Api {
                status: 403,
                message: "add rejected".into(),
            });
        }
        state
            .items
            .get_mut(playlist_id)
            .ok_or_else(|| not_found(playlist_id))?
            .extend(track_ids.iter().cloned());
        Ok(())
    }

    async fn unfollow_playlist(&self, playlist_id: &str) -> Result<()> {
        let mut state = self.state();
        if state.failing_unfollow.contains(playlist_id) {
            return Err(FestifyError::Api {
                status: 502,
                message: "unfollow failed".into(),
            });
        }
        state.playlists.retain(|p| p.id != playlist_id);
        Ok(())
    }
}
