use std::fmt;

/// Google Cloud settings for the text model, image model and bucket.
///
/// Built by the CLI's resolution chain; see `atelier-cli`'s `config`
/// module for where each field comes from.
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// Google Cloud project that owns the Vertex AI quota.
    pub project_id: String,
    /// Vertex AI region, e.g. `us-central1`.
    pub location: String,
    pub text_model: String,
    pub image_model: String,
    /// Bucket generated images are uploaded to.
    pub bucket: String,
    pub hmac_key: HmacKey,
    /// Fixed OAuth access token. When `None` tokens come from the metadata
    /// server.
    pub access_token: Option<String>,
    /// Override for the Vertex AI base URL (tests, private endpoints).
    pub vertex_endpoint: Option<String>,
    pub storage_endpoint: String,
    pub metadata_token_url: String,
}

impl CloudConfig {
    pub const DEFAULT_LOCATION: &str = "us-central1";
    pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-pro";
    pub const DEFAULT_IMAGE_MODEL: &str = "imagegeneration@006";
    pub const DEFAULT_BUCKET: &str = "campagin_creatives";
    pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";
    pub const DEFAULT_METADATA_TOKEN_URL: &str =
        "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

    /// Config with defaults for everything except the required values.
    pub fn new(project_id: impl Into<String>, hmac_key: HmacKey) -> Self {
        Self {
            project_id: project_id.into(),
            location: Self::DEFAULT_LOCATION.to_owned(),
            text_model: Self::DEFAULT_TEXT_MODEL.to_owned(),
            image_model: Self::DEFAULT_IMAGE_MODEL.to_owned(),
            bucket: Self::DEFAULT_BUCKET.to_owned(),
            hmac_key,
            access_token: None,
            vertex_endpoint: None,
            storage_endpoint: Self::DEFAULT_STORAGE_ENDPOINT.to_owned(),
            metadata_token_url: Self::DEFAULT_METADATA_TOKEN_URL.to_owned(),
        }
    }

    /// Vertex AI base URL: the override, or the regional endpoint.
    pub fn vertex_endpoint(&self) -> String {
        match &self.vertex_endpoint {
            Some(url) => url.trim_end_matches('/').to_owned(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        }
    }
}

/// A Cloud Storage HMAC interoperability key.
#[derive(Clone, PartialEq, Eq)]
pub struct HmacKey {
    pub access_id: String,
    pub secret: String,
}

impl HmacKey {
    pub fn new(access_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            access_id: access_id.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacKey")
            .field("access_id", &self.access_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}
