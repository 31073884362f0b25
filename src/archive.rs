//! Export archiving.
//!
//! Records are written as CSV and JSON side by side. Archiving is
//! best-effort: each format is attempted on its own and failures are only
//! logged.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::festival::sanitize_file_stem;
use crate::models::ExportRecord;

/// Where an export goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveKey {
    pub festival_slug: String,
    pub year: String,
    pub title: String,
}

impl ArchiveKey {
    pub fn new(
        festival_slug: impl Into<String>,
        year: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            festival_slug: festival_slug.into(),
            year: year.into(),
            title: title.into(),
        }
    }
}

/// Destination for sync export records.
pub trait Archiver: Send + Sync {
    /// Persist `records` under `key`. Never fails.
    fn write(&self, records: &[ExportRecord], key: &ArchiveKey);
}

/// Writes `{base_dir}/{slug}/{year}/{stem}.csv` and `.json`.
#[derive(Debug, Clone)]
pub struct FileArchiver {
    base_dir: PathBuf,
}

#[derive(Serialize)]
struct LineupRow<'a> {
    artist: &'a str,
}

impl FileArchiver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Path of the export for `key`, without extension.
    pub fn target_stem(&self, key: &ArchiveKey) -> PathBuf {
        self.base_dir
            .join(&key.festival_slug)
            .join(&key.year)
            .join(sanitize_file_stem(&key.title))
    }

    /// Write a normalized lineup as `[{artist}]` rows.
    pub fn write_lineup(&self, artists: &[String], key: &ArchiveKey) {
        let rows: Vec<LineupRow<'_>> = artists
            .iter()
            .map(|a| LineupRow { artist: a.as_str() })
            .collect();
        self.write_rows(&rows, key);
    }

    fn write_rows<T: Serialize>(&self, rows: &[T], key: &ArchiveKey) {
        let stem = self.target_stem(key);
        if let Some(dir) = stem.parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                warn!("Could not create export directory {}: {}", dir.display(), e);
                return;
            }
        }

        let csv_path = stem.with_extension("csv");
        match write_csv(&csv_path, rows) {
            Ok(()) => info!("Wrote {} rows to {}", rows.len(), csv_path.display()),
            Err(e) => warn!("CSV export to {} failed: {}", csv_path.display(), e),
        }

        let json_path = stem.with_extension("json");
        match write_json(&json_path, rows) {
            Ok(()) => info!("Wrote {} rows to {}", rows.len(), json_path.display()),
            Err(e) => warn!("JSON export to {} failed: {}", json_path.display(), e),
        }
    }
}

impl Archiver for FileArchiver {
    fn write(&self, records: &[ExportRecord], key: &ArchiveKey) {
        self.write_rows(records, key);
    }
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let json = serde_json::to_string_pretty(rows)?;
    std::fs::write(path, json)?;
    Ok(())
}
