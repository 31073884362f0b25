//! Spotify Web API client.
//!
//! Covers the handful of endpoints the sync engine uses. Every call carries
//! a timeout, is spaced by an optional client-side rate limiter and is
//! retried with exponential backoff on transient failures (429, 5xx,
//! connect/timeout errors).

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use governor::{clock::DefaultClock, state::direct::NotKeyed, state::InMemoryState, Quota, RateLimiter};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use super::CatalogClient;
use crate::config::Settings;
use crate::error::{FestifyError, Result};
use crate::models::artist::ArtistSearch;
use crate::models::track::{track_uri, TopTracks};
use crate::models::{Artist, Page, Playlist, PlaylistItem, Track, TrackId, User};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Longest `Retry-After` we are willing to sleep for inside one attempt.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Spotify Web API client bound to one access token.
///
/// # Example
///
/// ```rust,no_run
/// use festify::{CatalogClient, Settings, SpotifyApi};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let api = SpotifyApi::new(&Settings::default(), "access-token")?;
///     println!("Logged in as {}", api.current_user_id().await?);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct SpotifyApi {
    client: Client,
    base_url: String,
    access_token: String,
    market: String,
    max_retries: usize,
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl fmt::Debug for SpotifyApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyApi")
            .field("base_url", &self.base_url)
            .field("market", &self.market)
            .field("max_retries", &self.max_retries)
            .field("rate_limited", &self.limiter.is_some())
            .finish_non_exhaustive()
    }
}

impl SpotifyApi {
    /// Create a client for `access_token` using the HTTP settings in `settings`.
    pub fn new(settings: &Settings, access_token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("festify/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| FestifyError::Configuration(format!("Failed to create client: {}", e)))?;

        let limiter = settings
            .requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));

        let mut base_url = settings.api_base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            client,
            base_url,
            access_token: access_token.into(),
            market: settings.market.clone(),
            max_retries: settings.max_retries,
            limiter,
        })
    }

    /// Make a request, retrying transient failures.
    ///
    /// Returns `None` for empty response bodies.
    async fn call_api(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let url = format!("{}{}", self.base_url, endpoint);
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(500))
            .with_max_times(self.max_retries);
        // A POST that may have reached the server is not sent again.
        let resendable = method != Method::POST;

        (|| self.send_once(method.clone(), &url, params, body))
            .retry(backoff)
            .when(|err| {
                if resendable {
                    err.is_transient()
                } else {
                    err.is_unsent()
                }
            })
            .adjust(retry_delay)
            .notify(|err, delay| warn!("Retrying {} {} in {:?}: {}", method, url, delay, err))
            .await
    }

    /// One attempt at a request.
    async fn send_once(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        debug!("{} {} with params: {:?}", method, url, params);

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .query(params);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            warn!("Rate limited by Spotify (retry after {:?})", retry_after);
            return Err(FestifyError::RateLimited { retry_after });
        }

        let text = response.text().await?;

        if !status.is_success() {
            let message = api_error_message(&text);
            error!("Spotify API error ({}): {}", status, message);
            return Err(FestifyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&text)?))
    }

    /// GET an endpoint and deserialize the body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let data = self
            .call_api(Method::GET, endpoint, params, None)
            .await?
            .ok_or_else(|| FestifyError::NoData(endpoint.to_string()))?;
        Ok(serde_json::from_value(data)?)
    }
}

/// Backoff delay for the next attempt: a rate limit's `Retry-After` (capped)
/// replaces the exponential delay. `None` means no attempts are left.
fn retry_delay(err: &FestifyError, backoff: Option<Duration>) -> Option<Duration> {
    match (err, backoff) {
        (
            FestifyError::RateLimited {
                retry_after: Some(wait),
            },
            Some(_),
        ) => Some((*wait).min(MAX_RETRY_AFTER)),
        _ => backoff,
    }
}

/// Extract `error.message` from a Web API error body, or fall back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if body.chars().count() > 200 {
                format!("{}...", body.chars().take(200).collect::<String>())
            } else {
                body.to_string()
            }
        })
}

#[async_trait]
impl CatalogClient for SpotifyApi {
    async fn current_user_id(&self) -> Result<String> {
        let user: User = self.get_json("me", &[]).await?;
        Ok(user.id)
    }

    async fn search_artists(&self, name: &str, limit: u32) -> Result<Vec<Artist>> {
        let search: ArtistSearch = self
            .get_json(
                "search",
                &[
                    ("q", format!("artist:{}", name)),
                    ("type", "artist".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(search.artists.items)
    }

    async fn artist_top_tracks(&self, artist_id: &str) -> Result<Vec<Track>> {
        let top: TopTracks = self
            .get_json(
                &format!("artists/{}/top-tracks", artist_id),
                &[("market", self.market.clone())],
            )
            .await?;
        Ok(top.tracks)
    }

    async fn track(&self, track_id: &str) -> Result<Track> {
        self.get_json(&format!("tracks/{}", track_id), &[]).await
    }

    async fn current_user_playlists(&self, limit: u32, offset: u32) -> Result<Page<Playlist>> {
        self.get_json(
            "me/playlists",
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )
        .await
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Playlist> {
        let body = json!({
            "name": name,
            "public": false,
            "description": description,
        });
        let data = self
            .call_api(
                Method::POST,
                &format!("users/{}/playlists", user_id),
                &[],
                Some(&body),
            )
            .await?
            .ok_or_else(|| FestifyError::NoData(format!("create playlist {}", name)))?;
        Ok(serde_json::from_value(data)?)
    }

    async fn set_playlist_description(&self, playlist_id: &str, description: &str) -> Result<()> {
        let body = json!({ "description": description });
        self.call_api(
            Method::PUT,
            &format!("playlists/{}", playlist_id),
            &[],
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>> {
        self.get_json(
            &format!("playlists/{}/tracks", playlist_id),
            &[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("additional_types", "track".to_string()),
            ],
        )
        .await
    }

    async fn add_playlist_items(&self, playlist_id: &str, track_ids: &[TrackId]) -> Result<()> {
        let uris: Vec<String> = track_ids.iter().map(|id| track_uri(id)).collect();
        let body = json!({ "uris": uris });
        self.call_api(
            Method::POST,
            &format!("playlists/{}/tracks", playlist_id),
            &[],
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn unfollow_playlist(&self, playlist_id: &str) -> Result<()> {
        self.call_api(
            Method::DELETE,
            &format!("playlists/{}/followers", playlist_id),
            &[],
            None,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn test_api_error_message_from_json() {
        let body = r#"{"error": {"status": 404, "message": "Invalid playlist Id"}}"#;
        assert_eq!(api_error_message(body), "Invalid playlist Id");
    }

    #[test]
    fn test_api_error_message_from_oauth_style_body() {
        let body = r#"{"error": "invalid_grant"}"#;
        assert_eq!(api_error_message(body), "invalid_grant");
    }

    #[test]
    fn test_api_error_message_falls_back_to_text() {
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
        assert!(api_error_message(&"x".repeat(500)).ends_with("..."));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let settings = Settings {
            api_base_url: "http://localhost:9999/v1".into(),
            requests_per_second: Some(10),
            ..Default::default()
        };
        let api = SpotifyApi::new(&settings, "token").unwrap();
        assert_eq!(api.base_url, "http://localhost:9999/v1/");
        assert!(api.limiter.is_some());
    }

    #[test]
    fn test_retry_after_replaces_backoff_and_is_capped() {
        let backoff = Some(Duration::from_millis(500));
        let limited = |secs| FestifyError::RateLimited {
            retry_after: Some(Duration::from_secs(secs)),
        };

        assert_eq!(retry_delay(&limited(2), backoff), Some(Duration::from_secs(2)));
        assert_eq!(retry_delay(&limited(120), backoff), Some(MAX_RETRY_AFTER));
        assert_eq!(retry_delay(&limited(2), None), None);

        let unavailable = FestifyError::Api {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(retry_delay(&unavailable, backoff), backoff);
    }

    /// A canned HTTP response, optionally sent late.
    #[derive(Clone)]
    struct Reply {
        delay: Duration,
        status: u16,
        headers: Vec<(&'static str, &'static str)>,
        body: &'static str,
    }

    impl Reply {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                delay: Duration::ZERO,
                status,
                headers: Vec::new(),
                body,
            }
        }

        fn after(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn header(mut self, name: &'static str, value: &'static str) -> Self {
            self.headers.push((name, value));
            self
        }

        fn render(&self) -> String {
            let mut response = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
                self.status,
                self.body.len()
            );
            for (name, value) in &self.headers {
                response.push_str(&format!("{}: {}\r\n", name, value));
            }
            response.push_str("\r\n");
            response.push_str(self.body);
            response
        }
    }

    /// Local HTTP server answering request N with `replies[N]` (the last
    /// reply repeats). Returns the settings pointing at it and a request counter.
    async fn stub_server(replies: Vec<Reply>) -> (Settings, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let counter = Arc::clone(&counter);
                let replies = replies.clone();
                tokio::spawn(async move {
                    read_request(&mut socket).await;
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    let reply = replies[n.min(replies.len() - 1)].clone();
                    tokio::time::sleep(reply.delay).await;
                    let _ = socket.write_all(reply.render().as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        let settings = Settings {
            api_base_url: format!("http://{}/v1/", addr),
            request_timeout_secs: 1,
            max_retries: 2,
            ..Default::default()
        };
        (settings, hits)
    }

    /// Read one request: headers plus a `Content-Length` body.
    async fn read_request(socket: &mut TcpStream) {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let Ok(n) = socket.read(&mut buf).await else {
                return;
            };
            if n == 0 {
                return;
            }
            data.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&data);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    #[tokio::test]
    async fn test_server_errors_retry_until_limit() {
        let (settings, hits) = stub_server(vec![Reply::new(503, r#"{"error": {"message": "busy"}}"#)]).await;
        let api = SpotifyApi::new(&settings, "token").unwrap();

        let err = api.current_user_id().await.unwrap_err();
        assert!(matches!(err, FestifyError::Api { status: 503, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), settings.max_retries + 1);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let (settings, hits) = stub_server(vec![Reply::new(404, r#"{"error": {"message": "Not found"}}"#)]).await;
        let api = SpotifyApi::new(&settings, "token").unwrap();

        let err = api.track("missing").await.unwrap_err();
        assert!(matches!(err, FestifyError::Api { status: 404, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_waits_for_retry_after() {
        let (settings, hits) = stub_server(vec![
            Reply::new(429, "").header("Retry-After", "1"),
            Reply::new(200, r#"{"id": "me"}"#),
        ])
        .await;
        let api = SpotifyApi::new(&settings, "token").unwrap();

        let started = std::time::Instant::now();
        assert_eq!(api.current_user_id().await.unwrap(), "me");
        assert!(started.elapsed() >= Duration::from_millis(950));
        assert!(started.elapsed() < Duration::from_millis(1900));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timed_out_read_is_retried() {
        let (settings, hits) = stub_server(vec![
            Reply::new(200, r#"{"id": "late"}"#).after(Duration::from_millis(2500)),
            Reply::new(200, r#"{"id": "me"}"#),
        ])
        .await;
        let api = SpotifyApi::new(&settings, "token").unwrap();

        assert_eq!(api.current_user_id().await.unwrap(), "me");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timed_out_add_is_not_resent() {
        let (settings, hits) = stub_server(vec![
            Reply::new(201, r#"{"snapshot_id": "s1"}"#).after(Duration::from_millis(2500)),
            Reply::new(201, r#"{"snapshot_id": "s2"}"#),
        ])
        .await;
        let api = SpotifyApi::new(&settings, "token").unwrap();

        let err = api
            .add_playlist_items("p1", &["t1".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, FestifyError::Request(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_create_is_not_resent() {
        let (settings, hits) = stub_server(vec![
            Reply::new(502, ""),
            Reply::new(201, r#"{"id": "p1", "name": "x", "owner": {"id": "me"}}"#),
        ])
        .await;
        let api = SpotifyApi::new(&settings, "token").unwrap();

        assert!(api.create_playlist("me", "x", "").await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_add_is_resent() {
        let (settings, hits) = stub_server(vec![
            Reply::new(429, "").header("Retry-After", "1"),
            Reply::new(201, r#"{"snapshot_id": "s1"}"#),
        ])
        .await;
        let api = SpotifyApi::new(&settings, "token").unwrap();

        api.add_playlist_items("p1", &["t1".to_string()])
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_debug_hides_token() {
        let api = SpotifyApi::new(&Settings::default(), "super-secret").unwrap();
        assert!(!format!("{:?}", api).contains("super-secret"));
    }
}
