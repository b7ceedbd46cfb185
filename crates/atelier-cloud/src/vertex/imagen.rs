//! Imagen image generation via `predict`.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use atelier_core::upstream::{AspectRatio, GenerationError, ImageModel};

use super::VertexClient;

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Instance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    sample_count: usize,
    aspect_ratio: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PredictResponse {
    // Omitted entirely when every image was filtered.
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

impl PredictResponse {
    /// Decoded image bytes in prediction order.
    pub(crate) fn into_images(self) -> Result<Vec<Vec<u8>>, GenerationError> {
        let images = self
            .predictions
            .into_iter()
            .filter_map(|p| p.bytes_base64_encoded)
            .map(|encoded| {
                STANDARD
                    .decode(encoded)
                    .map_err(|e| GenerationError::MalformedResponse(format!("bad image data: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if images.is_empty() {
            return Err(GenerationError::MalformedResponse(
                "image model returned no images".to_owned(),
            ));
        }
        Ok(images)
    }
}

/// [`ImageModel`] backed by an Imagen model on Vertex AI.
#[derive(Debug)]
pub struct ImagenClient {
    vertex: Arc<VertexClient>,
    model: String,
}

impl ImagenClient {
    pub fn new(vertex: Arc<VertexClient>, model: impl Into<String>) -> Self {
        Self {
            vertex,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ImageModel for ImagenClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate_images(
        &self,
        prompt: &str,
        count: usize,
        aspect_ratio: AspectRatio,
    ) -> Result<Vec<Vec<u8>>, GenerationError> {
        let url = self.vertex.model_url(&self.model, "predict");
        let request = PredictRequest {
            instances: [Instance { prompt }],
            parameters: Parameters {
                sample_count: count,
                aspect_ratio: aspect_ratio.as_str(),
            },
        };
        let response: PredictResponse = self.vertex.post(&url, &request).await?;
        response.into_images()
    }
}
