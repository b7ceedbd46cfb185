//! The fixed set of workflow stages and the caller-supplied context that
//! accompanies each stage request.
//!
//! Each [`Stage`] has a URL slug (`product_ideation`) used for routing and a
//! display name (`Product Ideation`) embedded in prompts and echoed back in
//! the `stage` field of a completed [`crate::envelope::StageOutput`].

pub mod context;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use context::{ProductIdea, StageContext};

/// One step of the product-development workflow.
///
/// The workflow order is tracked by the caller; the server treats every
/// stage independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ProductIdeation,
    ImageGeneration,
    ProductDevelopment,
    Enrich,
    AnalysisAndInsights,
    AssortmentStrategy,
    ComponentManagement,
    DemandPlanning,
    SupplyPlanning,
    PlanBuildVisualizeAssortment,
    Purchase,
    Present,
    Produce,
    Ship,
    Allocate,
    Sell,
}

impl Stage {
    /// Every stage, in workflow order.
    pub const ALL: [Stage; 16] = [
        Self::ProductIdeation,
        Self::ImageGeneration,
        Self::ProductDevelopment,
        Self::Enrich,
        Self::AnalysisAndInsights,
        Self::AssortmentStrategy,
        Self::ComponentManagement,
        Self::DemandPlanning,
        Self::SupplyPlanning,
        Self::PlanBuildVisualizeAssortment,
        Self::Purchase,
        Self::Present,
        Self::Produce,
        Self::Ship,
        Self::Allocate,
        Self::Sell,
    ];

    /// URL slug, also the key under which callers store this stage's output
    /// in the [`StageContext`].
    pub fn slug(self) -> &'static str {
        match self {
            Self::ProductIdeation => "product_ideation",
            Self::ImageGeneration => "image_generation",
            Self::ProductDevelopment => "product_development",
            Self::Enrich => "enrich",
            Self::AnalysisAndInsights => "analysis_and_insights",
            Self::AssortmentStrategy => "assortment_strategy",
            Self::ComponentManagement => "component_management",
            Self::DemandPlanning => "demand_planning",
            Self::SupplyPlanning => "supply_planning",
            Self::PlanBuildVisualizeAssortment => "plan_build_visualize_assortment",
            Self::Purchase => "purchase",
            Self::Present => "present",
            Self::Produce => "produce",
            Self::Ship => "ship",
            Self::Allocate => "allocate",
            Self::Sell => "sell",
        }
    }

    /// Human-readable name used in prompts and in the `stage` response field.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::ProductIdeation => "Product Ideation",
            Self::ImageGeneration => "Image Generation",
            Self::ProductDevelopment => "Product Development",
            Self::Enrich => "Enrich",
            Self::AnalysisAndInsights => "Analysis & Insights",
            Self::AssortmentStrategy => "Assortment Strategy",
            Self::ComponentManagement => "Component Management",
            Self::DemandPlanning => "Demand Planning",
            Self::SupplyPlanning => "Supply Planning",
            Self::PlanBuildVisualizeAssortment => "Plan, Build & Visualize Assortment",
            Self::Purchase => "Purchase",
            Self::Present => "Present",
            Self::Produce => "Produce",
            Self::Ship => "Ship",
            Self::Allocate => "Allocate",
            Self::Sell => "Sell",
        }
    }

    /// HTTP path of this stage's endpoint.
    pub fn path(self) -> String {
        format!("/api/{}", self.slug())
    }

    /// Whether this stage produces images instead of model text.
    pub fn is_image_generation(self) -> bool {
        matches!(self, Self::ImageGeneration)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Stage {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.slug() == s)
            .ok_or_else(|| StageParseError(s.to_owned()))
    }
}

/// Error returned when parsing an unknown [`Stage`] slug.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown stage: {0:?}")]
pub struct StageParseError(pub String);
