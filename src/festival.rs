//! Festival naming conventions.
//!
//! Playlist titles, export file names and lineup directories are all derived
//! from a festival key and a year.

/// Lower-cased festival key with spaces replaced, suffixed with the year.
///
/// `schema_name(" Party San ", "2026")` is `"party_san_2026"`.
pub fn schema_name(festival_key: &str, year: &str) -> String {
    format!(
        "{}_{}",
        festival_key.trim().to_lowercase().replace(' ', "_"),
        year
    )
}

/// Title of the generated playlist, e.g. `"Festify · wacken_2026"`.
pub fn playlist_title(prefix: &str, festival_key: &str, year: &str) -> String {
    format!("{} · {}", prefix, schema_name(festival_key, year))
}

/// Directory-safe slug: lower case, word characters, whitespace and `-`
/// only, runs of whitespace collapsed. Empty input becomes `"unknown"`.
pub fn slug(text: &str) -> String {
    let kept: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        "unknown".to_string()
    } else {
        collapsed
    }
}

/// File stem for an export of `title`.
///
/// `"Festify · partysan_2026"` becomes `"festify_partysan_2026"`.
pub fn sanitize_file_stem(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    for c in title.chars() {
        let c = match c {
            '·' | ' ' | '.' | '-' => '_',
            c => c,
        };
        if !(c.is_alphanumeric() || c == '_') {
            continue;
        }
        if c == '_' && stem.ends_with('_') {
            continue;
        }
        stem.extend(c.to_lowercase());
    }
    stem.trim_matches('_').to_string()
}
