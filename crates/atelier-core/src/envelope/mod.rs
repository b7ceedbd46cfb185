//! Response shapes returned to HTTP callers, and the normalizer that turns
//! raw model text into them.
//!
//! Success and failure are modelled as tagged enums ([`StageOutcome`],
//! [`SummaryOutcome`]) but serialize `untagged`, so the wire format is the
//! flat JSON object the frontend expects.

pub mod normalize;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::images::GeneratedImageSet;
use crate::stage::Stage;

pub use normalize::{NormalizeError, parse_model_json, strip_code_fence};

/// Placeholder for `raw_output` when the upstream call produced no text.
pub const NO_RESPONSE: &str = "No response from model.";

// ---------------------------------------------------------------------------
// Stage output
// ---------------------------------------------------------------------------

/// Status reported on a completed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
}

/// Successful output of one stage.
///
/// `stage` and `status` are set for model-generated stages and left empty
/// for the image-generation stage. They are never read from model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    pub response_text: String,
    pub short_summary: String,
    pub key_data: Map<String, Value>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub status: Option<StageStatus>,
}

impl StageOutput {
    /// Mark this output as the completed result of `stage`.
    pub fn completed(mut self, stage: Stage) -> Self {
        self.stage = Some(stage.display_name().to_owned());
        self.status = Some(StageStatus::Completed);
        self
    }

    /// Output of the image-generation stage for the given image sets.
    pub fn for_image_sets(sets: Vec<GeneratedImageSet>, images_per_idea: usize) -> Self {
        let ideas = sets.len();
        let mut key_data = Map::new();
        key_data.insert(
            "generated_image_sets".to_owned(),
            serde_json::to_value(&sets).unwrap_or(Value::Array(Vec::new())),
        );
        Self {
            response_text: "Generated product images based on the ideation stage. \
                            Each idea has four visual concepts."
                .to_owned(),
            short_summary: format!(
                "Generated {} images for {ideas} product ideas.",
                ideas * images_per_idea
            ),
            key_data,
            stage: None,
            status: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Error envelope
// ---------------------------------------------------------------------------

/// `{error, raw_output?}` returned with HTTP 200 by the enveloping endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

impl ErrorEnvelope {
    /// Envelope without model output (precondition and image failures).
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            raw_output: None,
        }
    }

    /// Envelope carrying the model's raw text, or [`NO_RESPONSE`] if the
    /// call never returned any.
    pub fn with_raw_output(error: impl Into<String>, raw: Option<String>) -> Self {
        Self {
            error: error.into(),
            raw_output: Some(raw.unwrap_or_else(|| NO_RESPONSE.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of a stage request as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StageOutcome {
    Completed(StageOutput),
    Failed(ErrorEnvelope),
}

impl StageOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Result of a Digital Brief request as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryOutcome {
    Brief(DigitalBrief),
    Failed(ErrorEnvelope),
}

// ---------------------------------------------------------------------------
// Brief schemas
// ---------------------------------------------------------------------------

/// Executive summary of the workflow so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalBrief {
    pub title: String,
    pub sections: Vec<BriefSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefSection {
    pub heading: String,
    /// Single-word react-icons/fa name, e.g. `Lightbulb`.
    pub icon: String,
    pub content: String,
}

/// High-level features extracted from the whole brief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFeatures {
    pub key_features: Vec<String>,
}
