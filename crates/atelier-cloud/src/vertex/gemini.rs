//! Gemini text generation via `generateContent`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use atelier_core::upstream::{GenerationError, TextModel};

use super::VertexClient;

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub(crate) fn into_text(self) -> Result<String, GenerationError> {
        let blocked = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = blocked.unwrap_or_else(|| "no candidates".to_owned());
            return Err(GenerationError::MalformedResponse(format!(
                "model returned no output ({reason})"
            )));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "unknown".to_owned());
            return Err(GenerationError::MalformedResponse(format!(
                "model returned no text (finish reason: {reason})"
            )));
        }
        Ok(text)
    }
}

/// [`TextModel`] backed by a Gemini model on Vertex AI.
#[derive(Debug)]
pub struct GeminiClient {
    vertex: Arc<VertexClient>,
    model: String,
}

impl GeminiClient {
    pub fn new(vertex: Arc<VertexClient>, model: impl Into<String>) -> Self {
        Self {
            vertex,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = self.vertex.model_url(&self.model, "generateContent");
        let request = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };
        let response: GenerateContentResponse = self.vertex.post(&url, &request).await?;
        response.into_text()
    }
}
