//! The upstream service traits.
//!
//! All three traits are object-safe so the studio can hold them as
//! `Arc<dyn _>` and tests can substitute in-memory fakes.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use super::error::{GenerationError, StorageError};

/// A hosted text-generation model.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Model identifier, for logging.
    fn name(&self) -> &str;

    /// Send one prompt and return the model's raw text response.
    ///
    /// Implementations make exactly one upstream call and never retry.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// A hosted image-generation model.
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Model identifier, for logging.
    fn name(&self) -> &str;

    /// Request `count` images for `prompt` and return their encoded bytes
    /// in generation order.
    async fn generate_images(
        &self,
        prompt: &str,
        count: usize,
        aspect_ratio: AspectRatio,
    ) -> Result<Vec<Vec<u8>>, GenerationError>;
}

/// Object storage with time-limited signed read URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket (or equivalent namespace) objects are written to.
    fn bucket(&self) -> &str;

    /// Upload `bytes` under `key`, overwriting any existing object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
    -> Result<(), StorageError>;

    /// Issue a credential-free GET URL for `key`, valid for `ttl`.
    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;
}

/// Output aspect ratio for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Square,
}

impl AspectRatio {
    /// Wire value understood by the image model.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Compile-time assertion: the traits must stay object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn TextModel, _: &dyn ImageModel, _: &dyn ObjectStore) {}
};
