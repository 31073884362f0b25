//! Removal of previously generated playlists.

use tracing::{info, warn};

use super::registry::PLAYLISTS_PAGE_SIZE;
use crate::api::CatalogClient;
use crate::error::Result;
use crate::models::Playlist;

/// Unfollow every playlist owned by `owner_id` whose name starts with
/// `prefix`. Returns how many were removed.
///
/// Matches are collected over all pages before anything is deleted, so
/// removals cannot shift later pages. A failed removal is logged and the
/// rest still proceed.
pub async fn delete_by_prefix(
    client: &dyn CatalogClient,
    owner_id: &str,
    prefix: &str,
) -> Result<usize> {
    let mut matches: Vec<Playlist> = Vec::new();
    let mut offset = 0;
    loop {
        let page = client
            .current_user_playlists(PLAYLISTS_PAGE_SIZE, offset)
            .await?;
        let last = page.is_last(PLAYLISTS_PAGE_SIZE);
        matches.extend(
            page.items
                .into_iter()
                .filter(|p| p.name.starts_with(prefix) && p.is_owned_by(owner_id)),
        );
        if last {
            break;
        }
        offset += PLAYLISTS_PAGE_SIZE;
    }

    let mut removed = 0;
    for playlist in &matches {
        match client.unfollow_playlist(&playlist.id).await {
            Ok(()) => {
                info!("Deleted playlist '{}' ({})", playlist.name, playlist.id);
                removed += 1;
            }
            Err(e) => warn!("Failed to delete playlist '{}': {}", playlist.name, e),
        }
    }

    info!("Deleted {} of {} playlists starting with '{}'", removed, matches.len(), prefix);
    Ok(removed)
}
