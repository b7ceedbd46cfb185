//! Turn raw model text into a typed response.
//!
//! Models frequently wrap JSON in a Markdown fence. Only the exact
//! ```` ```json ... ``` ```` form is unwrapped: the first 7 and last 3
//! characters are dropped, with no tolerance for other fence variants.

use serde::de::DeserializeOwned;

const JSON_FENCE_OPEN: &str = "```json";
const FENCE_CLOSE_LEN: usize = 3;

/// Errors from parsing model output.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// The text was not valid JSON or did not match the expected schema.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Trim the text and remove a leading ```` ```json ```` fence together with
/// the final three characters.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix(JSON_FENCE_OPEN) else {
        return trimmed;
    };
    // Drop the last three characters, not bytes.
    match rest.char_indices().rev().nth(FENCE_CLOSE_LEN - 1) {
        Some((idx, _)) => &rest[..idx],
        None => "",
    }
}

/// Strip any code fence and deserialize the remainder as `T`.
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T, NormalizeError> {
    Ok(serde_json::from_str(strip_code_fence(raw))?)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::envelope::{KeyFeatures, StageOutput};

    #[test]
    fn fenced_payload_is_unwrapped() {
        let value: Value = parse_model_json("```json\n{\"a\":1}\n```").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn unfenced_payload_parses() {
        let value: Value = parse_model_json("{\"a\":1}").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let value: Value = parse_model_json("  \n```json\n{\"a\":1}\n```\n\n").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn plain_fence_is_not_unwrapped() {
        let result: Result<Value, _> = parse_model_json("```\n{\"a\":1}\n```");
        assert!(result.is_err());
    }

    #[test]
    fn strip_handles_short_and_unicode_input() {
        assert_eq!(strip_code_fence("```json"), "");
        assert_eq!(strip_code_fence("```json{}``"), "{");
        assert_eq!(strip_code_fence("```json\"é\"```"), "\"é\"");
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = parse_model_json::<Value>("{\"a\": ").unwrap_err();
        assert!(err.to_string().contains("EOF"), "unexpected error: {err}");
    }

    #[test]
    fn schema_mismatch_is_an_error() {
        let err = parse_model_json::<StageOutput>("{\"response_text\": \"x\"}").unwrap_err();
        assert!(err.to_string().contains("short_summary"), "unexpected error: {err}");
    }

    #[test]
    fn typed_schema_parses() {
        let features: KeyFeatures =
            parse_model_json("```json\n{\"key_features\": [\"Recycled nylon\"]}\n```").unwrap();
        assert_eq!(features.key_features, vec!["Recycled nylon".to_owned()]);
    }
}
