//! Finding and creating the target playlist.

use tracing::{debug, info};

use crate::api::CatalogClient;
use crate::error::Result;
use crate::models::Playlist;

/// Playlists requested per page.
pub const PLAYLISTS_PAGE_SIZE: u32 = 50;

/// First playlist of the current user named exactly `name` and owned by
/// `owner_id`. Same-name playlists of other owners are ignored.
pub async fn find_by_name(
    client: &dyn CatalogClient,
    owner_id: &str,
    name: &str,
) -> Result<Option<Playlist>> {
    let mut offset = 0;
    loop {
        let page = client
            .current_user_playlists(PLAYLISTS_PAGE_SIZE, offset)
            .await?;
        let last = page.is_last(PLAYLISTS_PAGE_SIZE);

        if let Some(found) = page
            .items
            .into_iter()
            .find(|p| p.name == name && p.is_owned_by(owner_id))
        {
            debug!("Found playlist '{}' ({})", name, found.id);
            return Ok(Some(found));
        }

        if last {
            return Ok(None);
        }
        offset += PLAYLISTS_PAGE_SIZE;
    }
}

/// Create a private playlist.
pub async fn create(
    client: &dyn CatalogClient,
    owner_id: &str,
    name: &str,
    description: &str,
) -> Result<Playlist> {
    let playlist = client.create_playlist(owner_id, name, description).await?;
    info!("Created playlist '{}' ({})", name, playlist.id);
    Ok(playlist)
}

/// Find the playlist or create it. The flag is `true` when it was created.
pub async fn ensure(
    client: &dyn CatalogClient,
    owner_id: &str,
    name: &str,
    description: &str,
) -> Result<(Playlist, bool)> {
    match find_by_name(client, owner_id, name).await? {
        Some(playlist) => Ok((playlist, false)),
        None => Ok((create(client, owner_id, name, description).await?, true)),
    }
}

pub async fn set_description(
    client: &dyn CatalogClient,
    playlist_id: &str,
    description: &str,
) -> Result<()> {
    client
        .set_playlist_description(playlist_id, description)
        .await?;
    debug!("Updated description of playlist {}", playlist_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCatalog;

    #[tokio::test]
    async fn test_find_requires_exact_name_and_owner() {
        let catalog = MemoryCatalog::new("me")
            .with_playlist("other", "Festify · wacken_2026", "someone", &[])
            .with_playlist("lower", "festify · wacken_2026", "me", &[])
            .with_playlist("mine", "Festify · wacken_2026", "me", &[]);

        let found = find_by_name(&catalog, "me", "Festify · wacken_2026")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "mine");
    }

    #[tokio::test]
    async fn test_find_pages_past_first_page() {
        let catalog = MemoryCatalog::new("me")
            .with_playlists("Mix ", "me", 120)
            .with_playlist("target", "Target", "me", &[]);

        let found = find_by_name(&catalog, "me", "Target").await.unwrap();
        assert_eq!(found.map(|p| p.id).as_deref(), Some("target"));
        assert_eq!(catalog.playlist_page_requests(), 3);
    }

    #[tokio::test]
    async fn test_ensure_creates_once() {
        let catalog = MemoryCatalog::new("me");

        let (first, created) = ensure(&catalog, "me", "Target", "desc").await.unwrap();
        assert!(created);
        let (second, created) = ensure(&catalog, "me", "Target", "desc").await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(catalog.created(), vec!["Target"]);
    }

    #[tokio::test]
    async fn test_set_description() {
        let catalog = MemoryCatalog::new("me").with_playlist("p1", "P", "me", &[]);
        set_description(&catalog, "p1", "new text").await.unwrap();
        assert_eq!(catalog.description_of("p1").as_deref(), Some("new text"));
    }
}
