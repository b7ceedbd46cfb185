//! Vertex AI publisher-model clients.
//!
//! [`VertexClient`] holds the transport, project and credentials shared by
//! [`GeminiClient`] (text) and [`ImagenClient`] (images).

pub mod gemini;
pub mod imagen;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use atelier_core::upstream::GenerationError;

use crate::auth::TokenSource;

pub use gemini::GeminiClient;
pub use imagen::ImagenClient;

/// Shared Vertex AI transport.
#[derive(Debug)]
pub struct VertexClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    location: String,
    auth: Arc<TokenSource>,
}

impl VertexClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        location: impl Into<String>,
        auth: Arc<TokenSource>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            project_id: project_id.into(),
            location: location.into(),
            auth,
        }
    }

    /// URL of `method` (e.g. `generateContent`) on a Google publisher model.
    pub fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{model}:{method}",
            self.base_url, self.project_id, self.location
        )
    }

    /// POST a JSON body with a bearer token and decode the JSON reply.
    pub(crate) async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, GenerationError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let token = self
            .auth
            .token()
            .await
            .map_err(|e| GenerationError::Auth(e.to_string()))?;

        tracing::debug!(%url, "calling vertex ai");
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                message: google_error_message(&text).unwrap_or(text),
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))
    }
}

/// Extract `error.message` from a Google API error body.
pub fn google_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_url_layout() {
        let client = VertexClient::new(
            reqwest::Client::new(),
            "https://us-central1-aiplatform.googleapis.com",
            "proj",
            "us-central1",
            Arc::new(TokenSource::Static("t".into())),
        );
        assert_eq!(
            client.model_url("gemini-2.5-pro", "generateContent"),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/proj/locations/us-central1/publishers/google/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn extracts_google_error_message() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(google_error_message(body).as_deref(), Some("Quota exceeded"));
        assert_eq!(google_error_message("<html>502</html>"), None);
        assert_eq!(google_error_message(r#"{"error": "flat"}"#), None);
    }
}
