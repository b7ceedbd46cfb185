//! Image persistence: generate images per product idea, upload them, and
//! hand back signed URLs.
//!
//! Ideas are processed one after another. Any failure aborts the batch;
//! objects uploaded before the failure stay in the bucket.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::prompt;
use crate::stage::ProductIdea;
use crate::upstream::{AspectRatio, GenerationError, ImageModel, ObjectStore, StorageError};

/// Number of images requested per product idea.
pub const IMAGES_PER_IDEA: usize = 4;

/// Lifetime of the signed URL handed to the client.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(60 * 60);

/// Object-key prefix for generated images.
pub const IMAGE_KEY_PREFIX: &str = "product-images";

const IMAGE_CONTENT_TYPE: &str = "image/png";

/// A signed image handle and its caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    pub description: String,
}

/// All images generated for one product idea, in generation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImageSet {
    pub idea_name: String,
    pub images: Vec<GeneratedImage>,
}

/// Errors from generating or persisting images.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Fresh object key of the form `product-images/<uuid>.png`.
pub fn new_object_key() -> String {
    format!("{IMAGE_KEY_PREFIX}/{}.png", Uuid::new_v4())
}

/// Caption for the `index`-th (zero-based) image of an idea.
pub fn image_description(index: usize, idea_name: &str) -> String {
    format!("Image {} for {idea_name}", index + 1)
}

/// Generate, upload and sign `count` images for each idea.
pub async fn generate_image_sets(
    model: &dyn ImageModel,
    store: &dyn ObjectStore,
    ideas: &[ProductIdea],
    instructions: &str,
    count: usize,
) -> Result<Vec<GeneratedImageSet>, ImageError> {
    let mut sets = Vec::with_capacity(ideas.len());
    for idea in ideas {
        sets.push(generate_image_set(model, store, idea, instructions, count).await?);
    }
    Ok(sets)
}

/// Generate, upload and sign `count` images for a single idea.
pub async fn generate_image_set(
    model: &dyn ImageModel,
    store: &dyn ObjectStore,
    idea: &ProductIdea,
    instructions: &str,
    count: usize,
) -> Result<GeneratedImageSet, ImageError> {
    let prompt = prompt::image_prompt(idea, instructions);
    let images = model
        .generate_images(&prompt, count, AspectRatio::Square)
        .await?;
    tracing::debug!(
        idea = %idea.name,
        model = model.name(),
        count = images.len(),
        "generated images"
    );

    let mut uploaded = Vec::with_capacity(images.len());
    for (index, bytes) in images.into_iter().enumerate() {
        let key = new_object_key();
        store.put(&key, bytes, IMAGE_CONTENT_TYPE).await?;
        let url = store.signed_url(&key, SIGNED_URL_TTL).await?;
        tracing::debug!(bucket = store.bucket(), %key, "stored generated image");
        uploaded.push(GeneratedImage {
            url,
            description: image_description(index, &idea.name),
        });
    }

    Ok(GeneratedImageSet {
        idea_name: idea.name.clone(),
        images: uploaded,
    })
}
