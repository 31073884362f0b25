//! Lineup files.
//!
//! Two formats are understood:
//!
//! - CSV with an `artist` header column
//! - JSON, either `["Name", ...]` or `[{"artist": "Name"}, ...]`

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::{FestifyError, Result};

/// Header of the artist column in CSV lineups.
pub const ARTIST_COLUMN: &str = "artist";

/// Load a lineup file, dispatching on its extension.
pub fn load_lineup<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FestifyError::Lineup(format!(
            "Lineup file not found: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let artists = match extension.as_str() {
        "csv" => {
            info!("Loading lineup from CSV: {}", path.display());
            parse_csv(&std::fs::read_to_string(path)?)
        }
        "json" => {
            info!("Loading lineup from JSON: {}", path.display());
            parse_json(&std::fs::read_to_string(path)?)
        }
        other => Err(FestifyError::Lineup(format!(
            "Unsupported lineup format: .{}",
            other
        ))),
    }
    .map_err(|e| match e {
        FestifyError::Lineup(msg) => FestifyError::Lineup(format!("{} ({})", msg, path.display())),
        other => other,
    })?;

    info!("Loaded {} artists from {}", artists.len(), path.display());
    Ok(artists)
}

/// Artist names from CSV text with an `artist` header.
pub fn parse_csv(contents: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(contents.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| FestifyError::Lineup(format!("Unreadable CSV header: {}", e)))?;
    let column = headers
        .iter()
        .position(|h| h.trim() == ARTIST_COLUMN)
        .ok_or_else(|| {
            FestifyError::Lineup(format!(
                "CSV must contain an '{}' column header",
                ARTIST_COLUMN
            ))
        })?;

    let mut artists = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            FestifyError::Lineup(format!("Malformed CSV row {}: {}", line + 2, e))
        })?;
        if let Some(name) = record.get(column).map(str::trim).filter(|n| !n.is_empty()) {
            artists.push(name.to_string());
        }
    }
    Ok(artists)
}

/// Artist names from a JSON list of strings or of `{"artist": ...}` objects.
pub fn parse_json(contents: &str) -> Result<Vec<String>> {
    let data: Value = serde_json::from_str(contents)
        .map_err(|e| FestifyError::Lineup(format!("Invalid JSON: {}", e)))?;

    let entries = data.as_array().ok_or_else(|| {
        FestifyError::Lineup("JSON must contain a list at the root level".to_string())
    })?;

    let names: Option<Vec<&str>> = if entries.iter().all(Value::is_string) {
        entries.iter().map(Value::as_str).collect()
    } else {
        entries
            .iter()
            .map(|e| e.get(ARTIST_COLUMN).and_then(Value::as_str))
            .collect()
    };

    let names = names.ok_or_else(|| {
        FestifyError::Lineup(format!(
            "JSON must be a list of strings or of objects with an '{}' string",
            ARTIST_COLUMN
        ))
    })?;

    Ok(names
        .into_iter()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect())
}

/// Write a lineup as a one-column CSV.
pub fn write_lineup_csv<P: AsRef<Path>>(path: P, artists: &[String]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([ARTIST_COLUMN])?;
    for artist in artists {
        writer.write_record([artist])?;
    }
    writer.flush()?;
    Ok(())
}
