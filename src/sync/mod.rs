//! Playlist synchronization engine.
//!
//! [`PlaylistSync`] brings a playlist in line with a lineup: it finds or
//! creates the playlist, snapshots its contents once, resolves every artist
//! to its top tracks and appends only the tracks that are neither in the
//! snapshot nor already claimed by another artist of the same run.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use festify::api::auth::authenticate;
//! use festify::{CatalogClient, PlaylistSync, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::default();
//!     let api = Arc::new(authenticate(&settings).await?);
//!     let user_id = api.current_user_id().await?;
//!
//!     let lineup = vec!["Asphyx".to_string(), "Necrot".to_string()];
//!     let report = PlaylistSync::from_settings(api, &settings)
//!         .run(&user_id, "Festify · partysan_2026", &lineup)
//!         .await?;
//!     println!("{}: {} new tracks", report.playlist_title, report.added);
//!     Ok(())
//! }
//! ```

pub mod claims;
pub mod cleanup;
pub mod membership;
pub mod mutator;
pub mod registry;
pub mod resolver;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::api::CatalogClient;
use crate::archive::{ArchiveKey, Archiver};
use crate::config::{Settings, DEFAULT_TOP_N, DEFAULT_WORKERS};
use crate::error::Result;
use crate::logging::Logging;
use crate::models::track::track_url;
use crate::models::{ExportRecord, TrackId};

pub use claims::ClaimSet;

/// Stages of one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Init,
    PlaylistResolved,
    MembershipSnapshot,
    Processing,
    Export,
    Done,
}

/// Outcome of a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub playlist_title: String,
    pub playlist_id: String,
    /// Whether the playlist was created by this run.
    pub created: bool,
    /// Distinct tracks added.
    pub added: usize,
    /// One record per added track, in lineup order.
    pub records: Vec<ExportRecord>,
    /// Artists without a search result.
    pub not_found: Vec<String>,
    /// Artists that failed, with the error message.
    pub failed: Vec<(String, String)>,
}

impl SyncReport {
    /// Number of artists that could not be processed.
    pub fn failures(&self) -> usize {
        self.not_found.len() + self.failed.len()
    }
}

/// Description written to generated playlists.
pub fn playlist_description(title: &str, top_n: usize) -> String {
    format!(
        "Top {} tracks per artist for {}. Generated by Festify.",
        top_n, title
    )
}

/// What happened to one artist.
#[derive(Debug)]
enum ArtistOutcome {
    NotFound,
    Unchanged,
    Added(Vec<ExportRecord>),
    Failed(String),
}

/// State shared by the per-artist workers of one run.
struct RunContext {
    client: Arc<dyn CatalogClient>,
    playlist_id: String,
    existing: Arc<HashSet<TrackId>>,
    claims: ClaimSet,
    top_n: usize,
}

/// Drives lineup to playlist synchronization.
pub struct PlaylistSync {
    client: Arc<dyn CatalogClient>,
    top_n: usize,
    workers: usize,
    logging: Option<Logging>,
    show_progress: bool,
    cancel: Arc<AtomicBool>,
    archive: Option<(Arc<dyn Archiver>, ArchiveKey)>,
}

impl PlaylistSync {
    pub fn new(client: Arc<dyn CatalogClient>) -> Self {
        Self {
            client,
            top_n: DEFAULT_TOP_N,
            workers: DEFAULT_WORKERS,
            logging: None,
            show_progress: false,
            cancel: Arc::new(AtomicBool::new(false)),
            archive: None,
        }
    }

    pub fn from_settings(client: Arc<dyn CatalogClient>, settings: &Settings) -> Self {
        Self::new(client)
            .with_top_n(settings.top_n)
            .with_workers(settings.worker_count())
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Parallel per-artist workers; `1` processes the lineup in order.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Show a progress bar and mute console logging while it is drawn.
    pub fn with_progress(mut self, logging: Logging) -> Self {
        self.logging = Some(logging);
        self.show_progress = true;
        self
    }

    /// Share a cancellation flag. Once set, no further artists are started.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Hand the export records to `archiver` once processing is done.
    pub fn with_archiver(mut self, archiver: Arc<dyn Archiver>, key: ArchiveKey) -> Self {
        self.archive = Some((archiver, key));
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Sync `lineup` into the playlist `title` owned by `user_id`.
    ///
    /// Fails only if the playlist cannot be resolved or its contents cannot
    /// be read. Per-artist problems end up in the report.
    pub async fn run(&self, user_id: &str, title: &str, lineup: &[String]) -> Result<SyncReport> {
        let mut state = SyncState::Init;
        let client = self.client.as_ref();
        let description = playlist_description(title, self.top_n);

        let (playlist, created) = registry::ensure(client, user_id, title, &description).await?;
        if !created && playlist.description_text() != description {
            if let Err(e) = registry::set_description(client, &playlist.id, &description).await {
                warn!("Could not update description of '{}': {}", title, e);
            }
        }
        state = advance(state, SyncState::PlaylistResolved, title);

        let existing = membership::playlist_track_ids(client, &playlist.id).await?;
        info!(
            "Playlist '{}' has {} tracks before sync",
            title,
            existing.len()
        );
        state = advance(state, SyncState::MembershipSnapshot, title);

        let context = Arc::new(RunContext {
            client: Arc::clone(&self.client),
            playlist_id: playlist.id.clone(),
            existing: Arc::new(existing),
            claims: ClaimSet::new(),
            top_n: self.top_n,
        });

        state = advance(state, SyncState::Processing, title);
        let progress = self.progress_bar(title, lineup.len());
        let quiet = match (&progress, &self.logging) {
            (Some(_), Some(logging)) => Some(logging.quiet_scope()),
            _ => None,
        };

        let outcomes = if self.workers == 1 {
            self.process_sequential(&context, lineup, progress.as_ref()).await
        } else {
            self.process_concurrent(&context, lineup, progress.as_ref()).await
        };

        if let Some(pb) = &progress {
            pb.finish_and_clear();
        }
        drop(quiet);

        let mut report = SyncReport {
            playlist_title: title.to_string(),
            playlist_id: playlist.id.clone(),
            created,
            ..Default::default()
        };
        for (artist, outcome) in outcomes {
            match outcome {
                ArtistOutcome::Added(records) => report.records.extend(records),
                ArtistOutcome::Unchanged => {}
                ArtistOutcome::NotFound => report.not_found.push(artist),
                ArtistOutcome::Failed(reason) => report.failed.push((artist, reason)),
            }
        }
        report.added = report.records.len();

        state = advance(state, SyncState::Export, title);
        if let Some((archiver, key)) = &self.archive {
            archiver.write(&report.records, key);
        }

        advance(state, SyncState::Done, title);
        info!(
            "Synced '{}': {} tracks added, {} artists not found, {} failed",
            title,
            report.added,
            report.not_found.len(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn process_sequential(
        &self,
        context: &RunContext,
        lineup: &[String],
        progress: Option<&ProgressBar>,
    ) -> Vec<(String, ArtistOutcome)> {
        let mut outcomes = Vec::with_capacity(lineup.len());
        for artist in lineup {
            if self.is_cancelled() {
                info!("Sync cancelled, {} artists left", lineup.len() - outcomes.len());
                break;
            }
            let outcome = process_artist(context, artist).await;
            if let Some(pb) = progress {
                pb.inc(1);
            }
            outcomes.push((artist.clone(), outcome));
        }
        outcomes
    }

    async fn process_concurrent(
        &self,
        context: &Arc<RunContext>,
        lineup: &[String],
        progress: Option<&ProgressBar>,
    ) -> Vec<(String, ArtistOutcome)> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for (index, artist) in lineup.iter().enumerate() {
            if self.is_cancelled() {
                info!("Sync cancelled, {} artists not started", lineup.len() - index);
                break;
            }
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let context = Arc::clone(context);
            let artist = artist.clone();
            let progress = progress.cloned();
            tasks.spawn(async move {
                let outcome = process_artist(&context, &artist).await;
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                drop(permit);
                (index, artist, outcome)
            });
        }

        let mut results = Vec::with_capacity(lineup.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!("Artist task failed: {}", e),
            }
        }

        results.sort_by_key(|(index, _, _)| *index);
        results
            .into_iter()
            .map(|(_, artist, outcome)| (artist, outcome))
            .collect()
    }

    fn progress_bar(&self, title: &str, len: usize) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message(title.to_string());
        Some(pb)
    }
}

fn advance(from: SyncState, to: SyncState, title: &str) -> SyncState {
    debug!(playlist = title, "{:?} -> {:?}", from, to);
    to
}

async fn process_artist(context: &RunContext, artist: &str) -> ArtistOutcome {
    match sync_artist(context, artist).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(artist, reason = %e, "Skipping artist");
            ArtistOutcome::Failed(e.to_string())
        }
    }
}

async fn sync_artist(context: &RunContext, artist: &str) -> Result<ArtistOutcome> {
    let client = context.client.as_ref();

    let Some(artist_id) = resolver::resolve_artist(client, artist).await? else {
        info!(artist, "Artist not found");
        return Ok(ArtistOutcome::NotFound);
    };

    let top = resolver::top_tracks(client, &artist_id, context.top_n).await?;
    let candidates: Vec<TrackId> = top
        .into_iter()
        .filter(|id| !context.existing.contains(id))
        .collect();

    let fresh = context.claims.claim(&candidates);
    if fresh.is_empty() {
        debug!(artist, "No new tracks");
        return Ok(ArtistOutcome::Unchanged);
    }

    if let Err(e) = mutator::add_tracks(client, &context.playlist_id, &fresh).await {
        context.claims.release(&fresh);
        return Err(e);
    }

    let mut records = Vec::with_capacity(fresh.len());
    for id in &fresh {
        let record = match client.track(id).await {
            Ok(track) => {
                let url = track.url().unwrap_or_else(|| track_url(id));
                ExportRecord::new(artist, track.name, id.as_str(), url)
            }
            Err(e) => {
                warn!(artist, track_id = %id, "Track metadata unavailable: {}", e);
                ExportRecord::new(artist, "", id.as_str(), track_url(id))
            }
        };
        records.push(record);
    }

    info!(artist, added = records.len(), "Added tracks");
    Ok(ArtistOutcome::Added(records))
}
