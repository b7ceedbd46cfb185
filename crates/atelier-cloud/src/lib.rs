//! Google Cloud implementations of the `atelier-core` upstream traits.
//!
//! - [`vertex::GeminiClient`]: `TextModel` over Vertex AI `generateContent`.
//! - [`vertex::ImagenClient`]: `ImageModel` over Vertex AI `predict`.
//! - [`storage::GcsStore`]: `ObjectStore` over Cloud Storage V4 signed URLs.
//!
//! [`build_studio`] wires all three from a [`CloudConfig`].

pub mod auth;
pub mod config;
pub mod storage;
pub mod vertex;

use std::sync::Arc;

use thiserror::Error;

use atelier_core::Studio;

pub use auth::{AuthError, MetadataTokenSource, TokenSource};
pub use config::{CloudConfig, HmacKey};
pub use storage::GcsStore;
pub use vertex::{GeminiClient, ImagenClient, VertexClient};

const USER_AGENT: &str = concat!("atelier/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Signing(#[from] storage::SigningError),
}

/// Build the process-wide [`Studio`] from cloud settings.
///
/// One HTTP client (and so one connection pool) is shared by all three
/// upstream clients.
pub fn build_studio(config: &CloudConfig) -> Result<Studio, CloudError> {
    let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

    let auth = match &config.access_token {
        Some(token) => TokenSource::Static(token.clone()),
        None => TokenSource::Metadata(MetadataTokenSource::new(
            http.clone(),
            config.metadata_token_url.clone(),
        )),
    };

    let vertex = Arc::new(VertexClient::new(
        http.clone(),
        config.vertex_endpoint(),
        config.project_id.clone(),
        config.location.clone(),
        Arc::new(auth),
    ));
    let text = GeminiClient::new(vertex.clone(), config.text_model.clone());
    let images = ImagenClient::new(vertex, config.image_model.clone());
    let store = GcsStore::new(
        http,
        &config.storage_endpoint,
        config.bucket.clone(),
        config.hmac_key.clone(),
    )?;

    tracing::info!(
        project = %config.project_id,
        location = %config.location,
        text_model = %config.text_model,
        image_model = %config.image_model,
        bucket = %config.bucket,
        "cloud clients configured"
    );

    Ok(Studio::new(Arc::new(text), Arc::new(images), Arc::new(store)))
}
