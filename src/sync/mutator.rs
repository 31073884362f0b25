//! Batched playlist additions.

use tracing::debug;

use crate::api::CatalogClient;
use crate::error::Result;
use crate::models::TrackId;

/// Most IDs the Web API accepts in one add call.
pub const MAX_BATCH: usize = 100;

/// Append `track_ids` in input order, one call per chunk of at most
/// [`MAX_BATCH`]. Returns the number of calls made.
///
/// Stops at the first failing chunk; earlier chunks stay applied.
pub async fn add_tracks(
    client: &dyn CatalogClient,
    playlist_id: &str,
    track_ids: &[TrackId],
) -> Result<usize> {
    let mut calls = 0;
    for chunk in track_ids.chunks(MAX_BATCH) {
        client.add_playlist_items(playlist_id, chunk).await?;
        calls += 1;
        debug!("Added {} tracks to playlist {}", chunk.len(), playlist_id);
    }
    Ok(calls)
}
