//! Built-in lineup sources for supported festivals.
//!
//! Each source fetches the festival's published lineup and hands the page
//! to a pure parse function, so the parsing can be tested offline.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{info, warn};

use super::LineupSource;
use crate::error::{FestifyError, Result};

const WACKEN_URL: &str = "https://www.wacken.com/fileadmin/Json/bandlist-concert.json";
const PARTYSAN_URL: &str = "https://www.party-san.de/bands-{year}";
const PROPHECY_URL: &str = "https://fest.prophecy.de/programme/";

static PARTYSAN_CARD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.card-body h3 a").expect("valid selector"));
static ANY_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));
static PROPHECY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div class="et_pb_text_inner">\s*<h3>\s*(.*?)\s*</h3>\s*</div>"#)
        .expect("valid regex")
});
static SUMMERBREEZE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<h3 class="teaser__title">\s*(.*?)\s*</h3>"#).expect("valid regex")
});

/// GET a page as text, failing on non-success status.
async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    info!("Fetching lineup from {}", url);
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Text content of an HTML snippet captured by a regex, entities decoded.
fn fragment_text(snippet: &str) -> String {
    Html::parse_fragment(snippet)
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}

/// Wacken Open Air: the JSON feed behind the lineup page.
#[derive(Debug, Clone)]
pub struct WackenSource {
    client: Client,
}

impl WackenSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Band names from the Wacken band list feed (`[{"title": ...}, ...]`).
pub fn parse_wacken(json: &str) -> Result<Vec<String>> {
    let data: Value = serde_json::from_str(json)?;
    let entries = data.as_array().ok_or_else(|| {
        FestifyError::Lineup("Wacken feed is not a JSON list".to_string())
    })?;

    Ok(entries
        .iter()
        .filter_map(|e| e.get("title").and_then(Value::as_str))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect())
}

#[async_trait]
impl LineupSource for WackenSource {
    fn name(&self) -> &str {
        "Wacken Open Air"
    }

    async fn fetch_lineup(&self, _year: &str) -> Result<Vec<String>> {
        let body = fetch_text(&self.client, WACKEN_URL).await?;
        let bands = parse_wacken(&body)?;
        info!("Parsed {} bands from Wacken feed", bands.len());
        Ok(bands)
    }
}

/// Party.San Open Air: band cards on the yearly bands page.
#[derive(Debug, Clone)]
pub struct PartySanSource {
    client: Client,
}

impl PartySanSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Band names from the Party.San bands page, sorted and unique.
///
/// Falls back to `/banddetail/` links when the card layout is not found.
pub fn parse_partysan(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let text_of = |el: scraper::ElementRef<'_>| el.text().collect::<String>().trim().to_string();

    let mut bands: BTreeSet<String> = document
        .select(&PARTYSAN_CARD)
        .map(text_of)
        .filter(|name| name.chars().count() > 1)
        .collect();

    if bands.is_empty() {
        warn!("No bands found with primary selector, trying fallback");
        bands = document
            .select(&ANY_LINK)
            .filter(|a| {
                a.value()
                    .attr("href")
                    .is_some_and(|href| href.contains("/banddetail/"))
            })
            .map(text_of)
            .filter(|name| name.chars().count() > 1)
            .collect();
    }

    bands.into_iter().collect()
}

#[async_trait]
impl LineupSource for PartySanSource {
    fn name(&self) -> &str {
        "Party.San Open Air"
    }

    async fn fetch_lineup(&self, year: &str) -> Result<Vec<String>> {
        let url = PARTYSAN_URL.replace("{year}", year);
        let html = fetch_text(&self.client, &url).await?;
        let bands = parse_partysan(&html);
        info!("Parsed {} bands from Party.San page", bands.len());
        Ok(bands)
    }
}

/// Prophecy Fest: band headings on the programme page.
#[derive(Debug, Clone)]
pub struct ProphecySource {
    client: Client,
}

impl ProphecySource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Band names from the Prophecy Fest programme, sorted and unique.
///
/// Multi-line headings (info blocks) are dropped, as is a trailing heading
/// naming the festival itself.
pub fn parse_prophecy(html: &str) -> Vec<String> {
    let mut artists: Vec<String> = PROPHECY_HEADING
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| fragment_text(m.as_str()))
        .filter(|a| !a.is_empty() && !a.contains('\n'))
        .collect();

    if artists
        .last()
        .is_some_and(|a| a.to_uppercase().contains("PROPHECY FEST"))
    {
        artists.pop();
    }

    artists
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[async_trait]
impl LineupSource for ProphecySource {
    fn name(&self) -> &str {
        "Prophecy Fest"
    }

    async fn fetch_lineup(&self, _year: &str) -> Result<Vec<String>> {
        let html = fetch_text(&self.client, PROPHECY_URL).await?;
        let artists = parse_prophecy(&html);
        info!("Parsed {} bands from Prophecy Fest page", artists.len());
        Ok(artists)
    }
}

/// Summer Breeze: parses a saved copy of the lineup page.
///
/// The page is rendered client-side, so it is read from
/// `{data_dir}/summerbreeze/{year}/summerbreeze_{year}.html`.
#[derive(Debug, Clone)]
pub struct SummerBreezeSource {
    data_dir: PathBuf,
}

impl SummerBreezeSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn html_path(&self, year: &str) -> PathBuf {
        self.data_dir
            .join("summerbreeze")
            .join(year)
            .join(format!("summerbreeze_{}.html", year))
    }
}

/// Band names from a Summer Breeze lineup page, in page order.
pub fn parse_summerbreeze(html: &str) -> Vec<String> {
    SUMMERBREEZE_TITLE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| fragment_text(m.as_str()))
        .filter(|b| !b.is_empty())
        .collect()
}

#[async_trait]
impl LineupSource for SummerBreezeSource {
    fn name(&self) -> &str {
        "Summer Breeze"
    }

    async fn fetch_lineup(&self, year: &str) -> Result<Vec<String>> {
        let path = self.html_path(year);
        let html = tokio::fs::read_to_string(&path).await.map_err(|e| {
            FestifyError::Lineup(format!(
                "Saved Summer Breeze page not readable ({}): {}",
                path.display(),
                e
            ))
        })?;
        Ok(parse_summerbreeze(&html))
    }
}
