use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Datelike, Local};
use clap::Parser;
use festify::api::auth::authenticate;
use festify::lineup::{resolve_lineup, LineupRegistry};
use festify::logging::{self, LogConfig};
use festify::sync::cleanup;
use festify::{
    festival, ArchiveKey, CatalogClient, FestifyError, FileArchiver, PlaylistSync, Settings,
};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "festify-cli")]
#[command(about = "Sync festival lineups into Spotify playlists", long_about = None)]
struct Cli {
    /// Festival key(s), e.g. wacken, partysan, prophecy, summerbreeze
    #[arg(short, long = "festival", num_args = 1..)]
    festivals: Vec<String>,

    /// Festival year (defaults to the current year)
    #[arg(short, long)]
    year: Option<String>,

    /// Write the normalized lineup as CSV and JSON
    #[arg(long)]
    export: bool,

    /// Create or update the festival playlist
    #[arg(long)]
    generate_playlist: bool,

    /// Delete previously generated playlists first
    #[arg(long)]
    delete_old_playlists: bool,

    /// Show a progress bar instead of per-artist log lines
    #[arg(short, long)]
    quiet: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, env = "FESTIFY_LOG_LEVEL", default_value = "INFO")]
    log_level: String,

    /// Top tracks per artist
    #[arg(long)]
    top_n: Option<usize>,

    /// Parallel artist workers
    #[arg(long)]
    workers: Option<usize>,

    /// Settings file (TOML)
    #[arg(long, env = "FESTIFY_CONFIG")]
    config: Option<PathBuf>,

    /// Lineup directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Playlist export directory
    #[arg(long)]
    playlist_dir: Option<PathBuf>,
}

impl Cli {
    fn settings(&self) -> festify::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_file(path).map_err(|e| {
                FestifyError::Configuration(format!("{}: {}", path.display(), e))
            })?,
            None => Settings::default(),
        };

        if let Some(top_n) = self.top_n {
            settings.top_n = top_n;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(dir) = &self.data_dir {
            settings.data_dir = dir.clone();
        }
        if let Some(dir) = &self.playlist_dir {
            settings.playlist_dir = dir.clone();
        }
        Ok(settings)
    }

    fn year(&self) -> String {
        self.year
            .clone()
            .unwrap_or_else(|| Local::now().year().to_string())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> festify::Result<ExitCode> {
    let settings = cli.settings()?;
    let logging = logging::init(&LogConfig {
        level: cli.log_level.clone(),
        log_dir: settings.log_dir.clone(),
        quiet: false,
    })?;
    let year = cli.year();

    if cli.festivals.is_empty() && !cli.delete_old_playlists {
        warn!("No festival given, nothing to do");
        return Ok(ExitCode::SUCCESS);
    }

    let session = if cli.generate_playlist || cli.delete_old_playlists {
        let api = Arc::new(authenticate(&settings).await?);
        let user_id = api.current_user_id().await?;
        info!("Authenticated as {}", user_id);
        Some((api, user_id))
    } else {
        None
    };

    if let (true, Some((api, user_id))) = (cli.delete_old_playlists, &session) {
        let removed =
            cleanup::delete_by_prefix(api.as_ref(), user_id, &settings.playlist_prefix).await?;
        println!("🗑️  Deleted {} old playlists", removed);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing artists in flight");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let scraper_client = reqwest::Client::builder()
        .user_agent(concat!("festify/", env!("CARGO_PKG_VERSION")))
        .timeout(settings.request_timeout())
        .build()
        .map_err(|e| FestifyError::Configuration(format!("Failed to create client: {}", e)))?;
    let registry = LineupRegistry::with_defaults(scraper_client, &settings.data_dir);

    let mut failed_festivals = 0;
    for key in &cli.festivals {
        let artists = match resolve_lineup(&registry, &settings.data_dir, key, &year).await {
            Ok(artists) => artists,
            Err(e) => {
                error!("Skipping {} {}: {}", key, year, e);
                failed_festivals += 1;
                continue;
            }
        };
        info!("Loaded {} artists for {} {}", artists.len(), key, year);
        let slug = festival::slug(key);

        if cli.export {
            let lineup_key = ArchiveKey::new(&slug, &year, festival::schema_name(key, &year));
            FileArchiver::new(&settings.data_dir).write_lineup(&artists, &lineup_key);
        }

        let Some((api, user_id)) = &session else {
            continue;
        };
        if !cli.generate_playlist {
            continue;
        }

        let title = festival::playlist_title(&settings.playlist_prefix, key, &year);
        let mut sync = PlaylistSync::from_settings(api.clone(), &settings)
            .with_cancel_flag(Arc::clone(&cancel))
            .with_archiver(
                Arc::new(FileArchiver::new(&settings.playlist_dir)),
                ArchiveKey::new(&slug, &year, &title),
            );
        if cli.quiet {
            sync = sync.with_progress(logging.clone());
        }

        match sync.run(user_id, &title, &artists).await {
            Ok(report) => {
                println!(
                    "✅ {}: {} new tracks ({} artists not found, {} failed)",
                    report.playlist_title,
                    report.added,
                    report.not_found.len(),
                    report.failed.len()
                );
                for (artist, reason) in &report.failed {
                    println!("   - {}: {}", artist, reason);
                }
            }
            Err(e) => {
                error!("Sync of '{}' failed: {}", title, e);
                failed_festivals += 1;
            }
        }

        if cancel.load(Ordering::SeqCst) {
            break;
        }
    }

    if !cli.festivals.is_empty() && failed_festivals == cli.festivals.len() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
