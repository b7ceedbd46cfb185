//! Integration tests for the studio pipeline over in-memory fakes.

use serde_json::{Value, json};

use atelier_core::envelope::{NO_RESPONSE, StageOutcome, SummaryOutcome};
use atelier_core::prompt::NO_INSTRUCTIONS;
use atelier_core::upstream::AspectRatio;
use atelier_core::{Stage, StageContext, StudioError};
use atelier_test_utils::{FakeImageModel, MemoryStore, Reply, ScriptedTextModel, TestStudio};

const STAGE_REPLY: &str = r#"```json
{
    "response_text": "Detailed plan",
    "short_summary": "One sentence.",
    "key_data": {"target_units": 1200}
}
```"#;

fn context(value: Value) -> StageContext {
    serde_json::from_value(value).unwrap()
}

fn ideation_context(names: &[&str]) -> StageContext {
    let ideas: Vec<Value> = names
        .iter()
        .map(|n| json!({"name": n, "description": format!("{n} description")}))
        .collect();
    context(json!({
        "product_ideation": {"key_data": {"product_ideas": ideas}}
    }))
}

fn outcome_json(outcome: &StageOutcome) -> Value {
    serde_json::to_value(outcome).unwrap()
}

// ---------------------------------------------------------------------------
// Text stages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stage_prompt_carries_context_and_instructions() {
    let fixture = TestStudio::replying(STAGE_REPLY);
    let ctx = context(json!({
        "instructions": "Prioritise recycled fabrics",
        "product_ideation": {"short_summary": "Two jackets"}
    }));

    for stage in Stage::ALL.into_iter().filter(|s| !s.is_image_generation()) {
        fixture.studio.process_stage(stage, ctx.clone()).await;
    }

    let serialized = context(json!({
        "product_ideation": {"short_summary": "Two jackets"}
    }))
    .to_prompt_json();
    let prompts = fixture.text.prompts();
    assert_eq!(prompts.len(), Stage::ALL.len() - 1);
    for prompt in &prompts {
        assert!(prompt.contains(&serialized), "context missing from prompt");
        assert!(prompt.contains("Prioritise recycled fabrics"));
        assert!(
            !prompt.contains("\"instructions\""),
            "instructions must be removed from the serialized context"
        );
    }
}

#[tokio::test]
async fn stage_prompt_uses_fallback_without_instructions() {
    let fixture = TestStudio::replying(STAGE_REPLY);
    fixture
        .studio
        .process_stage(Stage::Enrich, context(json!({})))
        .await;
    assert!(fixture.text.prompts()[0].contains(NO_INSTRUCTIONS));
}

#[tokio::test]
async fn stage_prompt_uses_fallback_for_empty_instruction_values() {
    let fixture = TestStudio::replying(STAGE_REPLY);
    for empty in [json!(false), json!(0), json!([]), json!({}), json!("")] {
        fixture
            .studio
            .process_stage(Stage::Enrich, context(json!({"instructions": empty})))
            .await;
    }
    let prompts = fixture.text.prompts();
    assert_eq!(prompts.len(), 5);
    assert!(prompts.iter().all(|p| p.contains(NO_INSTRUCTIONS)));
}

#[tokio::test]
async fn completed_stage_injects_stage_and_status() {
    let fixture = TestStudio::replying(STAGE_REPLY);
    let outcome = fixture
        .studio
        .process_stage(Stage::AnalysisAndInsights, context(json!({})))
        .await;

    assert_eq!(
        outcome_json(&outcome),
        json!({
            "response_text": "Detailed plan",
            "short_summary": "One sentence.",
            "key_data": {"target_units": 1200},
            "stage": "Analysis & Insights",
            "status": "completed"
        })
    );
}

#[tokio::test]
async fn model_supplied_stage_and_status_are_overwritten() {
    let replies = [
        r#"{"response_text": "r", "short_summary": "s", "key_data": {}, "status": "draft"}"#,
        r#"{"response_text": "r", "short_summary": "s", "key_data": {}, "stage": 3}"#,
        r#"{"response_text": "r", "short_summary": "s", "key_data": {}, "stage": "Sell", "status": "completed"}"#,
    ];
    for reply in replies {
        let fixture = TestStudio::replying(reply);
        let outcome = fixture
            .studio
            .process_stage(Stage::Enrich, context(json!({})))
            .await;
        assert_eq!(
            outcome_json(&outcome),
            json!({
                "response_text": "r",
                "short_summary": "s",
                "key_data": {},
                "stage": "Enrich",
                "status": "completed"
            }),
            "reply: {reply}"
        );
    }
}

#[tokio::test]
async fn malformed_model_output_becomes_envelope_with_raw_text() {
    let fixture = TestStudio::replying("Sorry, I cannot help with that.");
    let outcome = fixture
        .studio
        .process_stage(Stage::Purchase, context(json!({})))
        .await;

    assert!(outcome.is_failed());
    let body = outcome_json(&outcome);
    assert!(body["error"].as_str().unwrap().contains("expected value"));
    assert_eq!(body["raw_output"], "Sorry, I cannot help with that.");
}

#[tokio::test]
async fn missing_schema_field_becomes_envelope() {
    let fixture = TestStudio::replying(r#"{"response_text": "only this"}"#);
    let outcome = fixture
        .studio
        .process_stage(Stage::Sell, context(json!({})))
        .await;

    let body = outcome_json(&outcome);
    assert!(body["error"].as_str().unwrap().contains("short_summary"));
    assert_eq!(body["raw_output"], r#"{"response_text": "only this"}"#);
}

#[tokio::test]
async fn upstream_failure_becomes_envelope_with_placeholder() {
    let fixture = TestStudio::new(
        ScriptedTextModel::failing("quota exhausted"),
        FakeImageModel::new(),
        MemoryStore::new("test-bucket"),
    );
    let outcome = fixture
        .studio
        .process_stage(Stage::Ship, context(json!({})))
        .await;

    let body = outcome_json(&outcome);
    assert!(body["error"].as_str().unwrap().contains("quota exhausted"));
    assert_eq!(body["raw_output"], NO_RESPONSE);
}

// ---------------------------------------------------------------------------
// Image generation stage
// ---------------------------------------------------------------------------

#[tokio::test]
async fn image_stage_without_ideas_skips_image_model() {
    let fixture = TestStudio::replying(STAGE_REPLY);
    let outcome = fixture
        .studio
        .process_stage(Stage::ImageGeneration, ideation_context(&[]))
        .await;

    assert_eq!(
        outcome_json(&outcome),
        json!({"error": "No product ideas found from the 'Product Ideation' stage."})
    );
    assert_eq!(fixture.images.calls(), 0);
    assert_eq!(fixture.text.calls(), 0);
}

#[tokio::test]
async fn image_stage_produces_four_images_per_idea() {
    let fixture = TestStudio::replying(STAGE_REPLY);
    let mut map = ideation_context(&["Nordic Trench", "Minimal Puffer", "Rain Cape"])
        .as_map()
        .clone();
    map.insert("instructions".into(), json!("on a white background"));
    let ctx = StageContext::new(map);

    let outcome = fixture
        .studio
        .process_stage(Stage::ImageGeneration, ctx)
        .await;
    let body = outcome_json(&outcome);

    assert!(body.get("stage").is_none());
    assert!(body.get("status").is_none());
    assert_eq!(body["short_summary"], "Generated 12 images for 3 product ideas.");

    let sets = body["key_data"]["generated_image_sets"].as_array().unwrap();
    assert_eq!(sets.len(), 3);
    for (set, name) in sets
        .iter()
        .zip(["Nordic Trench", "Minimal Puffer", "Rain Cape"])
    {
        assert_eq!(set["idea_name"], name);
        let images = set["images"].as_array().unwrap();
        assert_eq!(images.len(), 4);
        for (i, image) in images.iter().enumerate() {
            assert_eq!(image["description"], format!("Image {} for {name}", i + 1));
            let url = image["url"].as_str().unwrap();
            assert!(url.starts_with("https://storage.test/test-bucket/product-images/"));
            assert!(url.ends_with(".png?expires_in=3600"));
        }
    }

    let requests = fixture.images.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.count == 4));
    assert!(requests.iter().all(|r| r.aspect_ratio == AspectRatio::Square));
    assert!(requests[0].prompt.contains("Name: Nordic Trench."));
    assert!(requests[0].prompt.ends_with("Additional instructions: on a white background"));
    assert_eq!(fixture.store.len(), 12);
    assert!(
        fixture
            .store
            .objects()
            .values()
            .all(|o| o.content_type == "image/png")
    );
}

#[tokio::test]
async fn image_stage_upload_failure_aborts_without_cleanup() {
    let fixture = TestStudio::new(
        ScriptedTextModel::default(),
        FakeImageModel::new(),
        MemoryStore::failing_after("test-bucket", 5),
    );
    let outcome = fixture
        .studio
        .process_stage(Stage::ImageGeneration, ideation_context(&["A", "B"]))
        .await;

    let body = outcome_json(&outcome);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Failed to generate images: "), "{error}");
    assert!(error.contains("quota exceeded"));
    assert!(body.get("raw_output").is_none());
    // Five uploads committed before the failure remain in the store.
    assert_eq!(fixture.store.len(), 5);
}

#[tokio::test]
async fn image_stage_model_failure_is_enveloped() {
    let fixture = TestStudio::new(
        ScriptedTextModel::default(),
        FakeImageModel::failing("rate limited"),
        MemoryStore::new("test-bucket"),
    );
    let outcome = fixture
        .studio
        .process_stage(Stage::ImageGeneration, ideation_context(&["A"]))
        .await;

    let body = outcome_json(&outcome);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to generate images: upstream returned 429")
    );
    assert!(fixture.store.is_empty());
}

// ---------------------------------------------------------------------------
// Regeneration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn regenerate_uses_matching_idea_from_context() {
    let fixture = TestStudio::replying(STAGE_REPLY);
    let ctx = ideation_context(&["Nordic Trench", "Minimal Puffer"]);
    let set = fixture
        .studio
        .regenerate_images("Minimal Puffer", "darker tones", &ctx)
        .await
        .unwrap();

    assert_eq!(set.idea_name, "Minimal Puffer");
    assert_eq!(set.images.len(), 4);
    let prompt = &fixture.images.requests()[0].prompt;
    assert!(prompt.contains("Description: Minimal Puffer description."));
    assert!(prompt.ends_with("Additional instructions: darker tones"));
}

#[tokio::test]
async fn regenerate_falls_back_for_unknown_idea() {
    let fixture = TestStudio::replying(STAGE_REPLY);
    let set = fixture
        .studio
        .regenerate_images("Ghost Parka", "", &ideation_context(&["Nordic Trench"]))
        .await
        .unwrap();

    assert_eq!(set.idea_name, "Ghost Parka");
    assert_eq!(set.images[3].description, "Image 4 for Ghost Parka");
    let prompt = &fixture.images.requests()[0].prompt;
    assert!(prompt.contains("Description: A stylish and innovative product."));
}

#[tokio::test]
async fn regenerate_propagates_failure() {
    let fixture = TestStudio::new(
        ScriptedTextModel::default(),
        FakeImageModel::failing("rate limited"),
        MemoryStore::new("test-bucket"),
    );
    let err = fixture
        .studio
        .regenerate_images("A", "", &StageContext::default())
        .await
        .unwrap_err();

    assert!(matches!(err, StudioError::ImageRegeneration(_)));
    assert!(err.to_string().starts_with("Failed to regenerate images: "));
}

// ---------------------------------------------------------------------------
// Summary and key features
// ---------------------------------------------------------------------------

#[tokio::test]
async fn summary_returns_parsed_brief_unmodified() {
    let reply = json!({
        "title": "Digital Brief: Nordic Layers",
        "sections": [{"heading": "Vision", "icon": "Lightbulb", "content": "Layering."}]
    });
    let fixture = TestStudio::replying(format!("```json\n{reply}\n```"));
    let outcome = fixture
        .studio
        .generate_summary(&ideation_context(&["A"]))
        .await;

    assert!(matches!(outcome, SummaryOutcome::Brief(_)));
    assert_eq!(serde_json::to_value(&outcome).unwrap(), reply);
    assert!(fixture.text.prompts()[0].contains("Digital Brief"));
}

#[tokio::test]
async fn summary_failure_is_enveloped() {
    let fixture = TestStudio::replying("not json");
    let outcome = fixture.studio.generate_summary(&StageContext::default()).await;

    let body = serde_json::to_value(&outcome).unwrap();
    assert!(body.get("error").is_some());
    assert_eq!(body["raw_output"], "not json");
}

#[tokio::test]
async fn key_features_parse_and_fail_distinctly() {
    let fixture = TestStudio::new(
        ScriptedTextModel::new([
            Reply::Text(r#"{"key_features": ["Recycled nylon", "Layering system"]}"#.into()),
            Reply::Text("garbage".into()),
        ]),
        FakeImageModel::new(),
        MemoryStore::new("test-bucket"),
    );
    let ctx = StageContext::default();

    let features = fixture.studio.generate_key_features(&ctx).await.unwrap();
    assert_eq!(features.key_features, vec!["Recycled nylon", "Layering system"]);

    let err = fixture.studio.generate_key_features(&ctx).await.unwrap_err();
    assert!(matches!(err, StudioError::Normalize(_)));
}
