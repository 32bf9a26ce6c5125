use std::sync::Arc;
use std::time::Duration;

use crate::agents::fallback::WithFallback;
use crate::agents::intent::IntentSource;
use crate::agents::observe::{Diagnostic, Observer};
use crate::agents::remote::{GeminiIntentSource, GeminiSettings, DEFAULT_MODEL, DEFAULT_TIMEOUT};
use crate::agents::rules::RuleBasedExtractor;
use crate::schema::catalog::IntentCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorMode {
    Gemini,
    Stub,
}

impl ExtractorMode {
    /// Anything other than `stub` (case-insensitive) selects the remote model.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("stub") {
            ExtractorMode::Stub
        } else {
            ExtractorMode::Gemini
        }
    }
}

/// Which intent source to build and how to reach the remote model.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub mode: ExtractorMode,
    pub gemini: GeminiSettings,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            mode: ExtractorMode::Gemini,
            gemini: GeminiSettings::default(),
        }
    }
}

impl ExtractorConfig {
    pub fn stub() -> Self {
        Self {
            mode: ExtractorMode::Stub,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `LLM_MODE`, `GEMINI_API_KEY`, `GEMINI_MODEL`, `GEMINI_BASE_URL`
    /// and `GEMINI_TIMEOUT_SECONDS` through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mode = lookup("LLM_MODE")
            .map(|m| ExtractorMode::parse(&m))
            .unwrap_or(ExtractorMode::Gemini);

        let timeout = lookup("GEMINI_TIMEOUT_SECONDS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        let defaults = GeminiSettings::default();

        Self {
            mode,
            gemini: GeminiSettings {
                api_key: lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()),
                model: lookup("GEMINI_MODEL")
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: lookup("GEMINI_BASE_URL")
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or(defaults.base_url),
                timeout,
            },
        }
    }
}

/// The rule-based extractor alone in stub mode or without an API key;
/// otherwise the remote model backed by the rules.
pub fn build_intent_source(
    catalog: &IntentCatalog,
    config: &ExtractorConfig,
    observer: Arc<dyn Observer>,
) -> Arc<dyn IntentSource> {
    let rules: Arc<dyn IntentSource> = Arc::new(RuleBasedExtractor);

    match config.mode {
        ExtractorMode::Stub => {
            tracing::info!("using rule-based intent extraction (LLM_MODE=stub)");
            rules
        }
        ExtractorMode::Gemini if config.gemini.api_key.is_none() => {
            observer.observe(&Diagnostic::SourceUnavailable {
                source: "gemini",
                reason: "GEMINI_API_KEY is not set; using rule-based extraction".to_string(),
            });
            rules
        }
        ExtractorMode::Gemini => {
            tracing::info!(model = %config.gemini.model, "using remote intent extraction");
            let remote = GeminiIntentSource::new(catalog, config.gemini.clone());
            Arc::new(WithFallback::new(remote, rules, observer))
        }
    }
}
