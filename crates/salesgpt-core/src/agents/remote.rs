//! Intent extraction through the Gemini `generateContent` REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::agents::fallback::FallibleIntentSource;
use crate::dsl::intent::Intent;
use crate::schema::catalog::{ChartType, Dimension, IntentCatalog, Metric};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const SCHEMA_DESCRIPTION: &str = "Database schema:
- products(id, name, category)
- sales(id, product_id, year, revenue)";

const INSTRUCTIONS: &str = "You are a strict JSON intent parser. \
You MUST output a single JSON object and nothing else. \
No markdown, no code fences, no comments. \
Never output SQL. \
Only use allowed intents/metrics/dimensions/filters.";

const RESPONSE_SHAPE: &str = r#"Return JSON with shape:
{
  "intent": string,
  "metrics": [string],
  "dimensions": [string],
  "filters": object,
  "chart": "line"|"bar"
}"#;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("no API key configured")]
    MissingCredentials,

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response carried no text")]
    EmptyResponse,

    #[error("response is not a valid intent object: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// Asks a Gemini model for the intent object. Every failure surfaces as a
/// [`RemoteError`]; pair it with a fallback source.
#[derive(Debug, Clone)]
pub struct GeminiIntentSource {
    client: Client,
    settings: GeminiSettings,
    vocabulary: String,
}

impl GeminiIntentSource {
    pub fn new(catalog: &IntentCatalog, settings: GeminiSettings) -> Self {
        Self {
            client: Client::new(),
            vocabulary: vocabulary(catalog),
            settings,
        }
    }

    pub fn settings(&self) -> &GeminiSettings {
        &self.settings
    }

    pub fn build_prompt(&self, question: &str) -> String {
        format!(
            "{INSTRUCTIONS}\n\nUser question:\n{question}\n\n{SCHEMA_DESCRIPTION}\n\n\
             Allowed options (must adhere):\n{}\n\n{RESPONSE_SHAPE}",
            self.vocabulary
        )
    }

    async fn call(&self, api_key: &str, question: &str) -> Result<String, RemoteError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: self.build_prompt(question),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateResponse = response.json().await?;
        let text: String = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(RemoteError::EmptyResponse);
        }
        Ok(text)
    }

    pub async fn request_intent(&self, question: &str) -> Result<Intent, RemoteError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(RemoteError::MissingCredentials)?;

        tracing::debug!(model = %self.settings.model, "requesting intent from remote model");

        let text = tokio::time::timeout(self.settings.timeout, self.call(api_key, question))
            .await
            .map_err(|_| RemoteError::Timeout(self.settings.timeout))??;

        parse_intent_payload(&text)
    }
}

#[async_trait]
impl FallibleIntentSource for GeminiIntentSource {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn try_extract(&self, question: &str) -> anyhow::Result<Intent> {
        Ok(self.request_intent(question).await?)
    }
}

/// The model's text must be exactly one JSON object of the intent shape.
pub fn parse_intent_payload(text: &str) -> Result<Intent, RemoteError> {
    let value: serde_json::Value =
        serde_json::from_str(text.trim()).map_err(|e| RemoteError::Malformed(e.to_string()))?;

    if !value.is_object() {
        return Err(RemoteError::Malformed("expected a JSON object".to_string()));
    }

    serde_json::from_value(value).map_err(|e| RemoteError::Malformed(e.to_string()))
}

/// The allowed vocabulary, rendered as pretty JSON for the prompt.
pub fn vocabulary(catalog: &IntentCatalog) -> String {
    let guide = json!({
        "intents": catalog.names().collect::<Vec<_>>(),
        "metrics": Metric::ALL.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
        "dimensions": Dimension::ALL.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
        "filters": {
            "years": "array of integers",
            "year_from": "integer",
            "year_to": "integer",
            "year": "integer",
            "category": "string",
            "categories": "array of strings",
            "product_id": "integer",
            "product_name": "string",
            "limit": "integer (1-50)",
            "order": "string ('top'|'bottom')",
            "entity": "string ('product'|'category')",
            "year_count": "integer (1-20)",
            "average": "boolean",
        },
        "charts": ChartType::ALL.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
    });

    serde_json::to_string_pretty(&guide).unwrap_or_else(|_| guide.to_string())
}
