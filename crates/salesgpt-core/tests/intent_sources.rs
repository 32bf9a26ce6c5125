use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use salesgpt_core::agents::fallback::{FallibleIntentSource, WithFallback};
use salesgpt_core::agents::intent::IntentSource;
use salesgpt_core::agents::observe::{Diagnostic, NoopObserver, Observer};
use salesgpt_core::agents::remote::{
    parse_intent_payload, vocabulary, GeminiIntentSource, GeminiSettings, RemoteError,
};
use salesgpt_core::agents::rules::{extract_intent, RuleBasedExtractor};
use salesgpt_core::config::{build_intent_source, ExtractorConfig, ExtractorMode};
use salesgpt_core::dsl::intent::Intent;
use salesgpt_core::schema::catalog::{ChartType, Dimension, IntentCatalog, IntentName};

#[derive(Default)]
struct RecordingObserver {
    seen: Mutex<Vec<Diagnostic>>,
}

impl RecordingObserver {
    fn seen(&self) -> Vec<Diagnostic> {
        self.seen.lock().unwrap().clone()
    }
}

impl Observer for RecordingObserver {
    fn observe(&self, diagnostic: &Diagnostic) {
        self.seen.lock().unwrap().push(diagnostic.clone());
    }
}

struct FailingSource;

#[async_trait]
impl FallibleIntentSource for FailingSource {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn try_extract(&self, _question: &str) -> anyhow::Result<Intent> {
        anyhow::bail!("service unavailable")
    }
}

struct FixedSource(Intent);

#[async_trait]
impl FallibleIntentSource for FixedSource {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn try_extract(&self, _question: &str) -> anyhow::Result<Intent> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn failing_primary_falls_back_to_rules() {
    let observer = Arc::new(RecordingObserver::default());
    let source = WithFallback::new(FailingSource, Arc::new(RuleBasedExtractor), observer.clone());

    let intent = source.extract("top 5 products in 2023").await;
    assert_eq!(intent, extract_intent("top 5 products in 2023"));

    let seen = observer.seen();
    assert_eq!(seen.len(), 1);
    match &seen[0] {
        Diagnostic::FallbackUsed {
            source,
            fallback,
            reason,
        } => {
            assert_eq!(*source, "failing");
            assert_eq!(*fallback, "rules");
            assert!(reason.contains("service unavailable"));
        }
        other => panic!("unexpected diagnostic {other:?}"),
    }
}

#[tokio::test]
async fn healthy_primary_is_used_verbatim() {
    let fixed = Intent::new(IntentName::SalesByCategory, Dimension::Category, ChartType::Bar).with_filter("year", 2020);
    let observer = Arc::new(RecordingObserver::default());
    let source = WithFallback::new(FixedSource(fixed.clone()), Arc::new(RuleBasedExtractor), observer.clone());

    assert_eq!(source.extract("anything at all").await, fixed);
    assert_eq!(source.name(), "fixed");
    assert!(matches!(observer.seen()[..], [Diagnostic::PrimaryUsed { source: "fixed", .. }]));
}

#[tokio::test]
async fn remote_without_credentials_fails_fast() {
    let remote = GeminiIntentSource::new(&IntentCatalog::standard(), GeminiSettings::default());

    let err = remote.request_intent("revenue in 2022").await.unwrap_err();
    assert!(matches!(err, RemoteError::MissingCredentials));

    let source = WithFallback::new(remote, Arc::new(RuleBasedExtractor), Arc::new(NoopObserver));
    let intent = source.extract("revenue in 2022").await;
    assert_eq!(intent, extract_intent("revenue in 2022"));
}

#[tokio::test]
async fn unreachable_remote_falls_back_within_timeout() {
    let settings = GeminiSettings {
        api_key: Some("test-key".to_string()),
        base_url: "http://127.0.0.1:9".to_string(),
        timeout: Duration::from_millis(500),
        ..GeminiSettings::default()
    };
    let remote = GeminiIntentSource::new(&IntentCatalog::standard(), settings);
    let observer = Arc::new(RecordingObserver::default());
    let source = WithFallback::new(remote, Arc::new(RuleBasedExtractor), observer.clone());

    let intent = source.extract("How are we doing overall?").await;
    assert_eq!(intent.name, "clarification_required");
    assert!(matches!(observer.seen()[..], [Diagnostic::FallbackUsed { source: "gemini", .. }]));
}

#[test]
fn payload_must_be_a_single_intent_object() {
    let intent = parse_intent_payload(
        r#" {"intent": "sales_by_product", "metrics": ["total_revenue"], "dimensions": ["product"], "filters": {"limit": 3}, "chart": "bar"} "#,
    )
    .expect("valid payload");
    assert_eq!(intent.name, "sales_by_product");
    assert_eq!(intent.filter("limit"), Some(&serde_json::json!(3)));

    for bad in [
        "[]",
        "\"sales_trend\"",
        "```json\n{\"intent\": \"sales_trend\"}\n```",
        "{\"intent\": \"sales_trend\"} {\"intent\": \"sales_trend\"}",
        "{\"intent\": \"sales_trend\", \"sql\": \"SELECT 1\"}",
        "",
    ] {
        assert!(
            matches!(parse_intent_payload(bad), Err(RemoteError::Malformed(_))),
            "accepted {bad:?}"
        );
    }
}

#[test]
fn prompt_carries_question_and_vocabulary() {
    let catalog = IntentCatalog::standard();
    let remote = GeminiIntentSource::new(&catalog, GeminiSettings::default());
    let prompt = remote.build_prompt("revenue in 2022");

    assert!(prompt.contains("User question:\nrevenue in 2022"));
    assert!(prompt.contains("products(id, name, category)"));
    assert!(prompt.contains("Never output SQL."));

    let vocab = vocabulary(&catalog);
    for name in IntentName::ALL {
        assert!(vocab.contains(&format!("\"{}\"", name.as_str())), "{name} missing");
    }
    assert!(prompt.contains(&vocab));
}

#[test]
fn config_reads_lookup() {
    let env = |key: &str| match key {
        "LLM_MODE" => Some("STUB".to_string()),
        "GEMINI_API_KEY" => Some("  ".to_string()),
        "GEMINI_TIMEOUT_SECONDS" => Some("3".to_string()),
        _ => None,
    };
    let config = ExtractorConfig::from_lookup(env);

    assert_eq!(config.mode, ExtractorMode::Stub);
    assert_eq!(config.gemini.api_key, None);
    assert_eq!(config.gemini.model, "gemini-2.5-flash");
    assert_eq!(config.gemini.timeout, Duration::from_secs(3));

    let defaults = ExtractorConfig::from_lookup(|_| None);
    assert_eq!(defaults.mode, ExtractorMode::Gemini);
    assert_eq!(defaults.gemini.timeout, Duration::from_secs(10));
}

#[test]
fn source_selection_follows_config() {
    let catalog = IntentCatalog::standard();

    let stub = build_intent_source(&catalog, &ExtractorConfig::stub(), Arc::new(NoopObserver));
    assert_eq!(stub.name(), "rules");

    let observer = Arc::new(RecordingObserver::default());
    let keyless = build_intent_source(&catalog, &ExtractorConfig::default(), observer.clone());
    assert_eq!(keyless.name(), "rules");
    assert!(matches!(
        observer.seen()[..],
        [Diagnostic::SourceUnavailable { source: "gemini", .. }]
    ));

    let mut keyed = ExtractorConfig::default();
    keyed.gemini.api_key = Some("k".to_string());
    let remote = build_intent_source(&catalog, &keyed, Arc::new(NoopObserver));
    assert_eq!(remote.name(), "gemini");
}
