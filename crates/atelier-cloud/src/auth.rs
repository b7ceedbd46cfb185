//! OAuth access tokens for Vertex AI calls.
//!
//! Two sources: a fixed token supplied at start-up, or the GCE/Cloud Run
//! metadata server. Metadata tokens are cached until shortly before they
//! expire.

use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

/// Tokens are refreshed this long before their reported expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("metadata server request failed: {0}")]
    Request(String),

    #[error("metadata server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid token response: {0}")]
    Decode(String),
}

/// Where bearer tokens come from.
#[derive(Debug)]
pub enum TokenSource {
    Static(String),
    Metadata(MetadataTokenSource),
}

impl TokenSource {
    /// Return a bearer token, fetching a fresh one if needed.
    pub async fn token(&self) -> Result<String, AuthError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::Metadata(source) => source.token().await,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    /// Seconds until expiry.
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Token source backed by the instance metadata server.
#[derive(Debug)]
pub struct MetadataTokenSource {
    http: reqwest::Client,
    url: String,
    cache: RwLock<Option<CachedToken>>,
}

impl MetadataTokenSource {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            cache: RwLock::new(None),
        }
    }

    pub async fn token(&self) -> Result<String, AuthError> {
        if let Some(token) = fresh(self.cache.read().await.as_ref()) {
            return Ok(token);
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = fresh(cache.as_ref()) {
            return Ok(token);
        }

        let fetched = self.fetch().await?;
        let lifetime = Duration::from_secs(fetched.expires_in).saturating_sub(REFRESH_MARGIN);
        tracing::debug!(expires_in = fetched.expires_in, "fetched metadata access token");
        *cache = Some(CachedToken {
            token: fetched.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(fetched.access_token)
    }

    async fn fetch(&self) -> Result<MetadataToken, AuthError> {
        let response = self
            .http
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<MetadataToken>()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))
    }
}

fn fresh(cached: Option<&CachedToken>) -> Option<String> {
    cached
        .filter(|c| Instant::now() < c.refresh_at)
        .map(|c| c.token.clone())
}
