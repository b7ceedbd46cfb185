//! Prompt construction for every model call the service makes.
//!
//! All functions here are pure: they take the already-prepared context and
//! return the text sent upstream.

use crate::stage::{ProductIdea, Stage, StageContext};

/// Sentence substituted when the caller gave no instructions for a stage.
pub const NO_INSTRUCTIONS: &str = "No specific instructions provided.";

// ---------------------------------------------------------------------------
// Stage prompts
// ---------------------------------------------------------------------------

/// Build the prompt for a text-producing stage.
///
/// `context` must already have its `instructions` entry removed (see
/// [`StageContext::take_instructions`]).
pub fn stage_prompt(stage: Stage, context: &StageContext, instructions: &str) -> String {
    let instructions = if instructions.is_empty() {
        NO_INSTRUCTIONS
    } else {
        instructions
    };
    let output_shape = match stage {
        Stage::ProductIdeation => ideation_output_shape(stage),
        _ => generic_output_shape(stage),
    };

    format!(
        "You are an expert assistant in a fashion product development workflow.
The current stage is: '{stage}'.
The data from all previous stages is provided below in JSON format:
{context}

The user has provided the following specific instructions for this stage:
---
{instructions}
---

{output_shape}",
        context = context.to_prompt_json(),
    )
}

fn generic_output_shape(stage: Stage) -> String {
    format!(
        r#"Based on all the information available, and paying close attention to the specific instructions, generate the output for the '{stage}' stage.

Your response MUST be a valid JSON object with the following structure:
{{
    "response_text": "A detailed, well-formatted markdown string for the stage's output. This should be a comprehensive analysis, plan, or strategy for the current stage.",
    "short_summary": "A concise, one-sentence summary of this stage's output.",
    "key_data": {{
        "data_point_1": "A critical data point or summary for this stage.",
        "data_point_2": "Another essential piece of information."
    }}
}}

For the '{stage}' stage, please identify 2-4 of the most critical data points to be used later in the process and put them in the key_data object. The keys for the key_data object should be descriptive and in snake_case."#
    )
}

fn ideation_output_shape(stage: Stage) -> String {
    format!(
        r#"Based on all the information available, and paying close attention to the specific instructions, generate the output for the '{stage}' stage.

Your response MUST be a valid JSON object with the following structure:
{{
    "response_text": "A detailed, well-formatted markdown string describing 2-3 distinct product ideas. Each idea should have a name and a detailed description.",
    "short_summary": "A concise, one-sentence summary of the product ideas.",
    "key_data": {{
        "product_ideas": [
            {{ "name": "Idea 1 Name", "description": "Detailed description for Idea 1." }},
            {{ "name": "Idea 2 Name", "description": "Detailed description for Idea 2." }}
        ]
    }}
}}"#
    )
}

// ---------------------------------------------------------------------------
// Image prompt
// ---------------------------------------------------------------------------

/// Build the image-model prompt for one product idea.
pub fn image_prompt(idea: &ProductIdea, instructions: &str) -> String {
    let instructions = if instructions.is_empty() {
        "None"
    } else {
        instructions
    };
    format!(
        "Create a photorealistic image of a fashion product based on the following idea: \
         Name: {name}. \
         Description: {description}. \
         Style should be clean, modern, and suitable for an e-commerce website. \
         Additional instructions: {instructions}",
        name = idea.name,
        description = idea.description,
    )
}

// ---------------------------------------------------------------------------
// Brief prompts
// ---------------------------------------------------------------------------

/// Build the "Digital Brief" summary prompt over the whole context.
pub fn summary_prompt(context: &StageContext) -> String {
    format!(
        r#"You are an expert AI assistant creating a "Digital Brief" for a new fashion product. This is a living document that will be updated as the project progresses through its stages.

The data from all completed stages of the product development workflow is provided below in JSON format:
{context}

Based on the cumulative information from all completed stages, please synthesize the data into a cohesive executive summary.
Your summary should tell a story of the product's journey so far. As more stages are completed, the summary will become more detailed.

The response MUST be a valid JSON object with the following structure:
{{
  "title": "Digital Brief: [Product Name/Concept]",
  "sections": [
    {{
      "heading": "Section Title 1 (e.g., Overall Project Status & Vision)",
      "icon": "Lightbulb",
      "content": "A detailed markdown-formatted paragraph for this section. Start with a high-level overview of the project's current status."
    }},
    {{
      "heading": "Section Title 2 (e.g., Key Insights So Far)",
      "icon": "Users",
      "content": "A detailed markdown-formatted paragraph for this section, summarizing key findings."
    }}
  ]
}}
Generate 2-4 relevant sections for the summary based on the available data. Icon names should be simple, single words from the react-icons/fa library (e.g., Lightbulb, Users, Pallet, ChartLine, Store)."#,
        context = context.to_prompt_json(),
    )
}

/// Build the key-feature extraction prompt over the whole context.
pub fn key_features_prompt(context: &StageContext) -> String {
    format!(
        r#"You are an expert fashion industry analyst. Your task is to analyze the complete digital brief provided below and extract the most critical, high-level features of the collection.

The complete brief data is as follows:
{context}

Based on this data, please identify 4-6 of the most essential concepts that define this collection. Focus on themes like the core aesthetic, target customer, key materials, standout product features, and sustainability angles.

Your response MUST be a valid JSON object with a single key "key_features", which is an array of strings. Each string should be a concise, impactful feature description.

Example Response Format:
{{
    "key_features": [
        "For the 20-25 year old, style-conscious Swedish urbanite.",
        "A 'Scandinavian Sporty Chic' aesthetic blending minimalism and function.",
        "Built on a versatile layering system for the unpredictable Nordic fall.",
        "Hero pieces include a convertible technical trench and a minimalist puffer.",
        "Emphasis on sustainable materials like Recycled Nylon and Organic Cotton."
    ]
}}"#,
        context = context.to_prompt_json(),
    )
}
