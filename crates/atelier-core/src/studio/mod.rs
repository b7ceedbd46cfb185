//! The request pipeline shared by every HTTP endpoint.
//!
//! A [`Studio`] is built once at start-up from the three upstream clients
//! and shared read-only across requests. Each operation takes the caller's
//! context by value; nothing is retained between calls.
//!
//! Error policy differs per operation and is part of the public contract:
//!
//! | Operation | On failure |
//! |---|---|
//! | [`Studio::process_stage`] | `StageOutcome::Failed` envelope |
//! | [`Studio::generate_summary`] | `SummaryOutcome::Failed` envelope |
//! | [`Studio::regenerate_images`] | `Err(StudioError)` |
//! | [`Studio::generate_key_features`] | `Err(StudioError)` |

use std::sync::Arc;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::envelope::{
    DigitalBrief, ErrorEnvelope, KeyFeatures, NormalizeError, StageOutcome, StageOutput,
    SummaryOutcome, parse_model_json,
};
use crate::images::{self, GeneratedImageSet, IMAGES_PER_IDEA, ImageError};
use crate::prompt;
use crate::stage::{ProductIdea, Stage, StageContext};
use crate::upstream::{GenerationError, ImageModel, ObjectStore, TextModel};

/// Errors surfaced by studio operations.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("No product ideas found from the 'Product Ideation' stage.")]
    NoProductIdeas,

    #[error("Failed to generate images: {0}")]
    ImageGeneration(#[source] ImageError),

    #[error("Failed to regenerate images: {0}")]
    ImageRegeneration(#[source] ImageError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// A failed text-model exchange, with whatever text the model returned.
#[derive(Debug)]
pub struct ModelFailure {
    pub error: StudioError,
    /// `None` when the upstream call itself failed.
    pub raw_output: Option<String>,
}

impl From<ModelFailure> for ErrorEnvelope {
    fn from(failure: ModelFailure) -> Self {
        ErrorEnvelope::with_raw_output(failure.error.to_string(), failure.raw_output)
    }
}

/// Upstream clients bundled for request handling.
#[derive(Clone)]
pub struct Studio {
    text: Arc<dyn TextModel>,
    images: Arc<dyn ImageModel>,
    store: Arc<dyn ObjectStore>,
}

impl Studio {
    pub fn new(
        text: Arc<dyn TextModel>,
        images: Arc<dyn ImageModel>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            text,
            images,
            store,
        }
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    /// Run one workflow stage against the caller's accumulated context.
    ///
    /// The `instructions` entry is removed from `context` before it is
    /// rendered into the prompt. Never fails: errors come back as
    /// [`StageOutcome::Failed`].
    pub async fn process_stage(&self, stage: Stage, mut context: StageContext) -> StageOutcome {
        let instructions = context.take_instructions();
        tracing::info!(%stage, has_instructions = !instructions.is_empty(), "processing stage");

        if stage.is_image_generation() {
            return self.image_stage(&context, &instructions).await;
        }

        let prompt = prompt::stage_prompt(stage, &context, &instructions);
        match self.ask::<StageOutput>(&prompt).await {
            Ok(output) => StageOutcome::Completed(output.completed(stage)),
            Err(failure) => {
                tracing::warn!(%stage, error = %failure.error, "stage failed");
                StageOutcome::Failed(failure.into())
            }
        }
    }

    async fn image_stage(&self, context: &StageContext, instructions: &str) -> StageOutcome {
        let ideas = context.product_ideas();
        if ideas.is_empty() {
            tracing::warn!("image generation requested without product ideas");
            return StageOutcome::Failed(ErrorEnvelope::new(
                StudioError::NoProductIdeas.to_string(),
            ));
        }

        let result = images::generate_image_sets(
            self.images.as_ref(),
            self.store.as_ref(),
            &ideas,
            instructions,
            IMAGES_PER_IDEA,
        )
        .await;

        match result {
            Ok(sets) => {
                tracing::info!(ideas = sets.len(), "generated image sets");
                StageOutcome::Completed(StageOutput::for_image_sets(sets, IMAGES_PER_IDEA))
            }
            Err(err) => {
                let err = StudioError::ImageGeneration(err);
                tracing::warn!(error = %err, "image generation failed");
                StageOutcome::Failed(ErrorEnvelope::new(err.to_string()))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Auxiliary operations
    // -----------------------------------------------------------------------

    /// Regenerate the image set for one idea with new instructions.
    ///
    /// The idea is looked up by exact name in the ideation output; an idea
    /// missing from context is replaced by [`ProductIdea::fallback`].
    pub async fn regenerate_images(
        &self,
        idea_name: &str,
        instruction: &str,
        context: &StageContext,
    ) -> Result<GeneratedImageSet, StudioError> {
        let idea = context.find_idea(idea_name).unwrap_or_else(|| {
            tracing::info!(idea = idea_name, "idea not in context, using fallback description");
            ProductIdea::fallback(idea_name)
        });

        images::generate_image_set(
            self.images.as_ref(),
            self.store.as_ref(),
            &idea,
            instruction,
            IMAGES_PER_IDEA,
        )
        .await
        .map_err(StudioError::ImageRegeneration)
    }

    /// Produce the Digital Brief for the whole context. Never fails.
    pub async fn generate_summary(&self, context: &StageContext) -> SummaryOutcome {
        let prompt = prompt::summary_prompt(context);
        match self.ask::<DigitalBrief>(&prompt).await {
            Ok(brief) => SummaryOutcome::Brief(brief),
            Err(failure) => {
                tracing::warn!(error = %failure.error, "summary generation failed");
                SummaryOutcome::Failed(failure.into())
            }
        }
    }

    /// Extract the collection's key features from the whole context.
    pub async fn generate_key_features(
        &self,
        context: &StageContext,
    ) -> Result<KeyFeatures, StudioError> {
        let prompt = prompt::key_features_prompt(context);
        self.ask::<KeyFeatures>(&prompt)
            .await
            .map_err(|failure| failure.error)
    }

    /// One model round-trip: send the prompt, normalize the reply into `T`.
    async fn ask<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, ModelFailure> {
        let raw = self.text.generate(prompt).await.map_err(|e| ModelFailure {
            error: e.into(),
            raw_output: None,
        })?;
        tracing::debug!(model = self.text.name(), bytes = raw.len(), "model responded");

        parse_model_json(&raw).map_err(|e| ModelFailure {
            error: e.into(),
            raw_output: Some(raw),
        })
    }
}
