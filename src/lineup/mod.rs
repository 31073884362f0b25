//! Festival lineups.
//!
//! A lineup is an ordered list of artist names. It is read from a local
//! file under `{data_dir}/{festival}/{year}/` when one exists, and otherwise
//! fetched through the festival's registered [`LineupSource`] and saved so
//! later runs reuse it.

pub mod file;
pub mod scrapers;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{FestifyError, Result};

pub use file::{load_lineup, write_lineup_csv};
pub use scrapers::{PartySanSource, ProphecySource, SummerBreezeSource, WackenSource};

/// Something that can produce a festival lineup for a year.
#[async_trait]
pub trait LineupSource: Send + Sync {
    /// Human-readable festival name.
    fn name(&self) -> &str;

    /// Fetch the artist names for `year`, in lineup order.
    async fn fetch_lineup(&self, year: &str) -> Result<Vec<String>>;
}

/// Maps festival keys to lineup sources.
#[derive(Clone, Default)]
pub struct LineupRegistry {
    sources: BTreeMap<String, Arc<dyn LineupSource>>,
}

impl std::fmt::Debug for LineupRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineupRegistry")
            .field("festivals", &self.keys())
            .finish()
    }
}

impl LineupRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in festival.
    pub fn with_defaults(client: Client, data_dir: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new();
        registry.register("wacken", Arc::new(WackenSource::new(client.clone())));
        registry.register("partysan", Arc::new(PartySanSource::new(client.clone())));
        registry.register("prophecy", Arc::new(ProphecySource::new(client)));
        registry.register("summerbreeze", Arc::new(SummerBreezeSource::new(data_dir)));
        registry
    }

    /// Register (or replace) the source for `key`. Keys are case-insensitive.
    pub fn register(&mut self, key: &str, source: Arc<dyn LineupSource>) {
        self.sources.insert(normalize_key(key), source);
    }

    /// Look up the source for `key`.
    pub fn get(&self, key: &str) -> Result<Arc<dyn LineupSource>> {
        self.sources
            .get(&normalize_key(key))
            .cloned()
            .ok_or_else(|| {
                FestifyError::UnknownFestival(format!(
                    "{} (known: {})",
                    key,
                    self.keys().join(", ")
                ))
            })
    }

    /// Registered festival keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Locate a local lineup file for `festival` and `year`.
///
/// Prefers `{key}_{year}.csv`, then `{key}_{year}.json`, then any CSV or
/// JSON file in the directory (first in sorted order).
pub fn find_lineup_path(data_dir: &Path, festival: &str, year: &str) -> Option<PathBuf> {
    let key = normalize_key(festival);
    let dir = data_dir.join(&key).join(year);

    for ext in ["csv", "json"] {
        let candidate = dir.join(format!("{}_{}.{}", key, year, ext));
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let mut others: Vec<PathBuf> = std::fs::read_dir(&dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_lowercase().as_str(), "csv" | "json"))
        })
        .collect();
    others.sort();
    others.into_iter().next()
}

/// Load the lineup for `festival`/`year`, fetching it if there is no local copy.
///
/// A fetched lineup is written to `{data_dir}/{key}/{year}/{key}_{year}.csv`.
pub async fn resolve_lineup(
    registry: &LineupRegistry,
    data_dir: &Path,
    festival: &str,
    year: &str,
) -> Result<Vec<String>> {
    if let Some(path) = find_lineup_path(data_dir, festival, year) {
        debug!("Using local lineup {}", path.display());
        return load_lineup(&path);
    }

    let source = registry.get(festival)?;
    info!("No local lineup for {} {}, fetching from {}", festival, year, source.name());

    let artists = source.fetch_lineup(year).await?;
    if artists.is_empty() {
        return Err(FestifyError::Lineup(format!(
            "{} returned an empty lineup for {}",
            source.name(),
            year
        )));
    }

    let key = normalize_key(festival);
    let path = data_dir
        .join(&key)
        .join(year)
        .join(format!("{}_{}.csv", key, year));
    write_lineup_csv(&path, &artists)?;

    Ok(artists)
}
