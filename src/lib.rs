//! # Festify
//!
//! Keeps a Spotify playlist in sync with a festival lineup.
//!
//! For every artist on the lineup the top tracks are looked up and any track
//! not yet in the playlist is appended. Running the same sync twice adds
//! nothing the second time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use festify::api::auth::authenticate;
//! use festify::{festival, CatalogClient, PlaylistSync, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::default();
//!     let api = Arc::new(authenticate(&settings).await?);
//!     let user_id = api.current_user_id().await?;
//!
//!     let lineup = festify::lineup::load_lineup("res/lineups/wacken/2026/wacken_2026.csv")?;
//!     let title = festival::playlist_title(&settings.playlist_prefix, "wacken", "2026");
//!
//!     let report = PlaylistSync::from_settings(api, &settings)
//!         .run(&user_id, &title, &lineup)
//!         .await?;
//!     println!("Added {} tracks to {}", report.added, report.playlist_title);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Web API client behind the [`CatalogClient`] trait, plus authentication
//! - [`sync`] - The synchronization engine and playlist cleanup
//! - [`lineup`] - Lineup files and festival lineup scrapers
//! - [`archive`] - CSV/JSON export of sync results

pub mod api;
pub mod archive;
pub mod config;
pub mod error;
pub mod festival;
pub mod lineup;
pub mod logging;
pub mod models;
pub mod sync;

#[cfg(test)]
mod testing;

pub use api::{CatalogClient, SpotifyApi};
pub use archive::{ArchiveKey, Archiver, FileArchiver};
pub use config::Settings;
pub use error::{FestifyError, Result};
pub use lineup::{LineupRegistry, LineupSource};
pub use models::{ExportRecord, Playlist, Track};
pub use sync::{PlaylistSync, SyncReport};
