//! Current contents of a playlist.

use std::collections::HashSet;

use tracing::debug;

use crate::api::CatalogClient;
use crate::error::Result;
use crate::models::TrackId;

/// Items requested per page.
pub const ITEMS_PAGE_SIZE: u32 = 100;

/// Every track ID currently in the playlist.
///
/// Pages until a page comes back short. Items without a track or without a
/// track ID (local files, removed tracks) are skipped.
pub async fn playlist_track_ids(
    client: &dyn CatalogClient,
    playlist_id: &str,
) -> Result<HashSet<TrackId>> {
    let mut ids = HashSet::new();
    let mut offset = 0;

    loop {
        let page = client
            .playlist_items(playlist_id, ITEMS_PAGE_SIZE, offset)
            .await?;
        ids.extend(page.items.iter().filter_map(|i| i.track_id()).map(str::to_string));

        if page.is_last(ITEMS_PAGE_SIZE) {
            break;
        }
        offset += ITEMS_PAGE_SIZE;
    }

    debug!("Playlist {} holds {} tracks", playlist_id, ids.len());
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCatalog;

    fn numbered(count: usize) -> Vec<String> {
        (0..count).map(|n| format!("t{}", n)).collect()
    }

    #[tokio::test]
    async fn test_pagination_stops_on_short_page() {
        let tracks = numbered(307);
        let refs: Vec<&str> = tracks.iter().map(String::as_str).collect();
        let catalog = MemoryCatalog::new("me").with_playlist("p1", "P", "me", &refs);

        let ids = playlist_track_ids(&catalog, "p1").await.unwrap();
        assert_eq!(ids.len(), 307);
        assert_eq!(catalog.item_page_requests(), 4);
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_one_empty_page() {
        let tracks = numbered(200);
        let refs: Vec<&str> = tracks.iter().map(String::as_str).collect();
        let catalog = MemoryCatalog::new("me").with_playlist("p1", "P", "me", &refs);

        assert_eq!(playlist_track_ids(&catalog, "p1").await.unwrap().len(), 200);
        assert_eq!(catalog.item_page_requests(), 3);
    }

    #[tokio::test]
    async fn test_empty_playlist() {
        let catalog = MemoryCatalog::new("me").with_playlist("p1", "P", "me", &[]);
        assert!(playlist_track_ids(&catalog, "p1").await.unwrap().is_empty());
        assert_eq!(catalog.item_page_requests(), 1);
    }

    #[tokio::test]
    async fn test_duplicates_collapse() {
        let catalog = MemoryCatalog::new("me").with_playlist("p1", "P", "me", &["t1", "t1", "t2"]);
        assert_eq!(playlist_track_ids(&catalog, "p1").await.unwrap().len(), 2);
    }
}
