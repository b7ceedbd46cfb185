//! Google Cloud Storage [`ObjectStore`].
//!
//! Both uploads and downloads go through V4 signed URLs, so the store only
//! needs an HMAC key: an upload is a `PUT` to a short-lived signed URL.

pub mod signing;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use atelier_core::upstream::{ObjectStore, StorageError};

use crate::config::HmacKey;

pub use signing::{SignRequest, SigningError, V4Signer};

/// Lifetime of the signed URL used for each upload.
const UPLOAD_URL_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug)]
pub struct GcsStore {
    http: reqwest::Client,
    signer: V4Signer,
    bucket: String,
}

impl GcsStore {
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        bucket: impl Into<String>,
        key: HmacKey,
    ) -> Result<Self, SigningError> {
        Ok(Self {
            http,
            signer: V4Signer::new(key, endpoint)?,
            bucket: bucket.into(),
        })
    }

    fn sign(
        &self,
        method: &str,
        key: &str,
        ttl: Duration,
        headers: &[(&str, &str)],
    ) -> Result<String, StorageError> {
        let request = SignRequest {
            method,
            bucket: &self.bucket,
            object: key,
            expires_in: ttl,
            headers,
        };
        self.signer
            .sign(&request, Utc::now())
            .map_err(|e| StorageError::Signing {
                key: key.to_owned(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = self.sign(
            "PUT",
            key,
            UPLOAD_URL_TTL,
            &[("content-type", content_type)],
        )?;

        let size = bytes.len();
        let response = self
            .http
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Upload {
                key: key.to_owned(),
                message: format!("{status}: {body}"),
            });
        }
        tracing::debug!(bucket = %self.bucket, %key, size, "uploaded object");
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        self.sign("GET", key, ttl, &[])
    }
}
