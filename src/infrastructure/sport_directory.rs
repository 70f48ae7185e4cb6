//! Player→sport directory used by the optional external classification step
//!
//! The HTTP directory rate-limits at the client, caches answers for the life
//! of the process and maps every failure to a `LookupError`. Callers treat an
//! error exactly like "no match".

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Deserialize;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::domain::Sport;
use crate::infrastructure::config::SportLookupConfig;
use crate::infrastructure::extraction_error::LookupError;
use crate::infrastructure::knowledge::tokens::pattern_keys;

fn directory_key(name: &str) -> String {
    pattern_keys(name).join(" ")
}

#[async_trait]
pub trait PlayerSportDirectory: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(Sport::Unknown)` when the directory does not know the player
    async fn resolve_sport_for_player(&self, name: &str) -> Result<Sport, LookupError>;
}

#[derive(Debug, Deserialize)]
struct DirectoryResponse {
    sport: Option<String>,
}

/// Directory served over HTTP: `GET {base_url}/players/sport?name=...`
/// answering `{"sport": "basketball"}`.
pub struct HttpSportDirectory {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    endpoint: String,
    enabled: bool,
    timeout_ms: u64,
    cache: RwLock<HashMap<String, Sport>>,
}

impl HttpSportDirectory {
    pub fn new(config: &SportLookupConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second).context("Rate limit must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            endpoint: format!("{}/players/sport", config.base_url.trim_end_matches('/')),
            enabled: config.enabled,
            timeout_ms: config.timeout_ms,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn fetch(&self, name: &str) -> Result<Sport, LookupError> {
        self.rate_limiter.until_ready().await;
        trace!("Sport directory request for '{}'", name);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("name", name)])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let parsed: DirectoryResponse =
            serde_json::from_str(&body).map_err(|e| LookupError::Malformed(e.to_string()))?;
        let sport = parsed
            .sport
            .ok_or_else(|| LookupError::Malformed("missing 'sport' field".to_string()))?;

        Ok(sport.parse().unwrap_or_default())
    }

    fn classify(&self, error: reqwest::Error) -> LookupError {
        if error.is_timeout() {
            LookupError::Timeout(self.timeout_ms)
        } else {
            LookupError::Http(error)
        }
    }
}

#[async_trait]
impl PlayerSportDirectory for HttpSportDirectory {
    fn name(&self) -> &str {
        &self.endpoint
    }

    async fn resolve_sport_for_player(&self, name: &str) -> Result<Sport, LookupError> {
        if !self.enabled {
            return Err(LookupError::Disabled);
        }
        let key = directory_key(name);
        if key.is_empty() {
            return Ok(Sport::Unknown);
        }
        if let Some(sport) = self.cache.read().await.get(&key) {
            return Ok(*sport);
        }

        let sport = self.fetch(name).await?;
        debug!("Sport directory resolved '{}' as {}", name, sport);
        self.cache.write().await.insert(key, sport);
        Ok(sport)
    }
}

/// Fixed in-process directory for tests and offline deployments
#[derive(Debug, Clone, Default)]
pub struct StaticSportDirectory {
    players: HashMap<String, Sport>,
}

impl StaticSportDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_player(mut self, name: &str, sport: Sport) -> Self {
        self.players.insert(directory_key(name), sport);
        self
    }
}

#[async_trait]
impl PlayerSportDirectory for StaticSportDirectory {
    fn name(&self) -> &str {
        "static"
    }

    async fn resolve_sport_for_player(&self, name: &str) -> Result<Sport, LookupError> {
        Ok(self.players.get(&directory_key(name)).copied().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot-per-connection HTTP responder; counts the requests it served
    async fn serve(status: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}"), hits)
    }

    fn config(base_url: String) -> SportLookupConfig {
        SportLookupConfig {
            enabled: true,
            base_url,
            timeout_ms: 1000,
            ..SportLookupConfig::default()
        }
    }

    #[tokio::test]
    async fn test_resolves_and_caches() {
        let (url, hits) = serve("200 OK", r#"{"sport":"basketball"}"#).await;
        let directory = HttpSportDirectory::new(&config(url)).unwrap();

        let first = directory.resolve_sport_for_player("Anthony Edwards").await.unwrap();
        let second = directory.resolve_sport_for_player("anthony  edwards").await.unwrap();
        assert_eq!(first, Sport::Basketball);
        assert_eq!(second, Sport::Basketball);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(directory.cached_len().await, 1);
    }

    #[tokio::test]
    async fn test_disabled_directory_sends_nothing() {
        let (url, hits) = serve("200 OK", r#"{"sport":"basketball"}"#).await;
        let directory = HttpSportDirectory::new(&SportLookupConfig {
            enabled: false,
            ..config(url)
        })
        .unwrap();

        let err = directory.resolve_sport_for_player("Anthony Edwards").await.unwrap_err();
        assert!(matches!(err, LookupError::Disabled));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(directory.cached_len().await, 0);
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let (url, _) = serve("503 Service Unavailable", "{}").await;
        let directory = HttpSportDirectory::new(&config(url)).unwrap();
        let err = directory.resolve_sport_for_player("Tobin Heath").await.unwrap_err();
        assert!(matches!(err, LookupError::Status { status: 503 }));
        assert_eq!(directory.cached_len().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let (url, _) = serve("200 OK", r#"{"league":"nba"}"#).await;
        let directory = HttpSportDirectory::new(&config(url)).unwrap();
        let err = directory.resolve_sport_for_player("Tobin Heath").await.unwrap_err();
        assert!(matches!(err, LookupError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_static_directory() {
        let directory = StaticSportDirectory::new().with_player("Tobin Heath", Sport::Soccer);
        assert_eq!(directory.resolve_sport_for_player("TOBIN HEATH").await.unwrap(), Sport::Soccer);
        assert_eq!(directory.resolve_sport_for_player("Nobody Known").await.unwrap(), Sport::Unknown);
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let mut config = config("http://127.0.0.1:1".to_string());
        config.max_requests_per_second = 0;
        assert!(HttpSportDirectory::new(&config).is_err());
    }
}
