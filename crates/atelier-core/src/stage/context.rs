//! Caller-supplied stage context.
//!
//! The context is an opaque JSON object keyed by stage slug. The server
//! reads exactly two things out of it: the free-text `instructions` for the
//! current request, and the product ideas produced by the ideation stage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the caller's free-text instructions for the current stage.
pub const INSTRUCTIONS_KEY: &str = "instructions";

/// Placeholder used when an idea is missing its name or description.
const MISSING_FIELD: &str = "N/A";

/// Accumulated output of all previously completed stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageContext(Map<String, Value>);

impl StageContext {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Remove the `instructions` entry and return it as text.
    ///
    /// A missing entry or an empty value (`null`, `false`, `0`, `""`, `[]`,
    /// `{}`) yields an empty string. Other non-string values are rendered as
    /// compact JSON.
    pub fn take_instructions(&mut self) -> String {
        match self.0.shift_remove(INSTRUCTIONS_KEY) {
            None => String::new(),
            Some(value) if is_empty_value(&value) => String::new(),
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
        }
    }

    /// Serialize the context for embedding in a prompt (2-space indent), in
    /// the caller's key order.
    pub fn to_prompt_json(&self) -> String {
        // Serializing a Map<String, Value> cannot fail.
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_owned())
    }

    /// Product ideas from `product_ideation.key_data.product_ideas`.
    ///
    /// Returns an empty list when any part of the path is absent or is not
    /// the expected JSON type.
    pub fn product_ideas(&self) -> Vec<ProductIdea> {
        self.0
            .get("product_ideation")
            .and_then(|v| v.get("key_data"))
            .and_then(|v| v.get("product_ideas"))
            .and_then(Value::as_array)
            .map(|ideas| ideas.iter().map(ProductIdea::from_value).collect())
            .unwrap_or_default()
    }

    /// Find the idea whose name matches `name` exactly.
    pub fn find_idea(&self, name: &str) -> Option<ProductIdea> {
        self.product_ideas().into_iter().find(|idea| idea.name == name)
    }
}

impl From<Map<String, Value>> for StageContext {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A product concept produced by the ideation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductIdea {
    pub name: String,
    pub description: String,
}

impl ProductIdea {
    /// Description given to an idea that is regenerated by name but absent
    /// from the context.
    pub const FALLBACK_DESCRIPTION: &str = "A stylish and innovative product.";

    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Synthesized idea used when a regeneration target is not in context.
    pub fn fallback(name: impl Into<String>) -> Self {
        Self::new(name, Self::FALLBACK_DESCRIPTION)
    }

    fn from_value(value: &Value) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(MISSING_FIELD)
                .to_owned()
        };
        Self {
            name: field("name"),
            description: field("description"),
        }
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn context(value: Value) -> StageContext {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn take_instructions_removes_key() {
        let mut ctx = context(json!({"instructions": "make it blue", "enrich": {}}));
        assert_eq!(ctx.take_instructions(), "make it blue");
        assert!(!ctx.as_map().contains_key(INSTRUCTIONS_KEY));
        assert!(ctx.as_map().contains_key("enrich"));
    }

    #[test]
    fn take_instructions_defaults_to_empty() {
        let mut ctx = context(json!({}));
        assert_eq!(ctx.take_instructions(), "");

        let empties = [
            json!(null),
            json!(false),
            json!(0),
            json!(0.0),
            json!(""),
            json!([]),
            json!({}),
        ];
        for empty in empties {
            let mut ctx = context(json!({"instructions": empty}));
            assert_eq!(ctx.take_instructions(), "", "instructions: {empty}");
            assert!(!ctx.as_map().contains_key(INSTRUCTIONS_KEY));
        }
    }

    #[test]
    fn prompt_json_keeps_caller_key_order() {
        let mut ctx: StageContext = serde_json::from_str(
            r#"{"zeta": 1, "instructions": "x", "alpha": {"b": 2, "a": 1}, "mid": 3}"#,
        )
        .unwrap();
        ctx.take_instructions();
        let rendered = ctx.to_prompt_json();
        let positions: Vec<usize> = ["\"zeta\"", "\"alpha\"", "\"b\"", "\"a\"", "\"mid\""]
            .iter()
            .map(|key| rendered.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{rendered}");
    }

    #[test]
    fn take_instructions_renders_non_strings() {
        let mut ctx = context(json!({"instructions": ["a", 1]}));
        assert_eq!(ctx.take_instructions(), "[\"a\",1]");

        let mut ctx = context(json!({"instructions": true}));
        assert_eq!(ctx.take_instructions(), "true");
    }

    #[test]
    fn product_ideas_reads_nested_path() {
        let ctx = context(json!({
            "product_ideation": {"key_data": {"product_ideas": [
                {"name": "Trench", "description": "Convertible"},
                {"name": "Puffer"}
            ]}}
        }));
        let ideas = ctx.product_ideas();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0], ProductIdea::new("Trench", "Convertible"));
        assert_eq!(ideas[1], ProductIdea::new("Puffer", "N/A"));
    }

    #[test]
    fn product_ideas_empty_when_path_missing() {
        assert!(context(json!({})).product_ideas().is_empty());
        assert!(
            context(json!({"product_ideation": {"key_data": {}}}))
                .product_ideas()
                .is_empty()
        );
        assert!(
            context(json!({"product_ideation": {"key_data": {"product_ideas": "none"}}}))
                .product_ideas()
                .is_empty()
        );
    }

    #[test]
    fn find_idea_matches_exact_name() {
        let ctx = context(json!({
            "product_ideation": {"key_data": {"product_ideas": [
                {"name": "Trench", "description": "Convertible"}
            ]}}
        }));
        assert!(ctx.find_idea("Trench").is_some());
        assert!(ctx.find_idea("trench").is_none());
    }

    #[test]
    fn prompt_json_is_pretty_printed() {
        let ctx = context(json!({"enrich": {"a": 1}}));
        assert_eq!(ctx.to_prompt_json(), "{\n  \"enrich\": {\n    \"a\": 1\n  }\n}");
    }
}
