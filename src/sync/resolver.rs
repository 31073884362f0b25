//! Artist name to catalog IDs.

use std::collections::HashSet;

use tracing::debug;

use crate::api::CatalogClient;
use crate::error::Result;
use crate::models::TrackId;

/// Only the first search result is ever considered.
const SEARCH_LIMIT: u32 = 1;

/// Resolve an artist name to the ID of the first search result.
pub async fn resolve_artist(client: &dyn CatalogClient, name: &str) -> Result<Option<String>> {
    let artists = client.search_artists(name, SEARCH_LIMIT).await?;
    let id = artists.into_iter().next().map(|a| a.id);
    debug!(artist = name, id = ?id, "Resolved artist");
    Ok(id)
}

/// The artist's top track IDs in catalog order, without duplicates, at most `limit`.
pub async fn top_tracks(
    client: &dyn CatalogClient,
    artist_id: &str,
    limit: usize,
) -> Result<Vec<TrackId>> {
    let tracks = client.artist_top_tracks(artist_id).await?;
    let mut seen = HashSet::new();
    Ok(tracks
        .into_iter()
        .filter_map(|t| t.id)
        .filter(|id| seen.insert(id.clone()))
        .take(limit)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCatalog;

    #[tokio::test]
    async fn test_resolve_artist() {
        let catalog = MemoryCatalog::new("me").with_artist("Asphyx", "a1", &[]);
        assert_eq!(
            resolve_artist(&catalog, "asphyx").await.unwrap(),
            Some("a1".to_string())
        );
        assert_eq!(resolve_artist(&catalog, "Nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_top_tracks_dedup_and_truncate() {
        let catalog =
            MemoryCatalog::new("me").with_artist("A", "a1", &["t1", "t2", "t1", "t3", "t4"]);
        assert_eq!(
            top_tracks(&catalog, "a1", 3).await.unwrap(),
            vec!["t1", "t2", "t3"]
        );
        assert!(top_tracks(&catalog, "a1", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_error_propagates() {
        let catalog = MemoryCatalog::new("me").fail_search_for("A");
        assert!(resolve_artist(&catalog, "A").await.is_err());
    }
}
