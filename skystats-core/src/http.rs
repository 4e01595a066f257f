//! HTTP transport: retries with exponential backoff and an on-disk response cache.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::{
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info, warn};

use crate::{config::HttpConfig, error::FetchError};

/// Delivers documents as text. Pipelines depend on this rather than on reqwest.
#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    async fn fetch_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, FetchError>;
}

/// Raw response bodies stored indefinitely, keyed by the full request URL.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, signature: &str) -> PathBuf {
        let key = blake3::hash(signature.as_bytes()).to_hex();
        self.dir.join(format!("{key}.body"))
    }

    pub fn get(&self, signature: &str) -> Result<Option<String>, FetchError> {
        match fs::read_to_string(self.path(signature)) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn put(&self, signature: &str, body: &str) -> Result<(), FetchError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(signature), body)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: ClientWithMiddleware,
    cache: Option<ResponseCache>,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client")?;

        let min_delay = Duration::from_millis(config.backoff_base_ms);
        let policy = ExponentialBackoff::builder()
            .retry_bounds(min_delay, min_delay.max(Duration::from_secs(10)))
            .build_with_max_retries(config.retries);

        let http = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(policy))
            .build();

        Ok(Self { http, cache: None })
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn send(&self, url: &Url) -> Result<String, FetchError> {
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| FetchError::Body {
                url: url.to_string(),
                source,
            })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl Fetcher for HttpTransport {
    async fn fetch_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let url = request_url(url, query)?;

        if let Some(cache) = &self.cache {
            match cache.get(url.as_str()) {
                Ok(Some(body)) => {
                    debug!(%url, "response cache hit");
                    return Ok(body);
                }
                Ok(None) => {}
                Err(e) => warn!(%url, error = %e, "unreadable cache entry, fetching"),
            }
        }

        let body = self.send(&url).await?;
        info!(%url, bytes = body.len(), "fetched");

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(url.as_str(), &body) {
                warn!(%url, error = %e, "failed to cache response");
            }
        }

        Ok(body)
    }
}

/// Full request URL; doubles as the cache signature.
pub fn request_url(url: &str, query: &[(&str, String)]) -> Result<Url, FetchError> {
    let parsed = if query.is_empty() {
        Url::parse(url)
    } else {
        Url::parse_with_params(url, query.iter())
    };
    parsed.map_err(|e| FetchError::Url {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
