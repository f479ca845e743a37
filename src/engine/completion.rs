// AiMan Engine — Completion Endpoint Client
// Non-streaming Gemini `generateContent` call. Request and response
// shaping are pure helpers so the wire format is testable without a
// network; the trait is the seam the chat controller mocks in tests.

use crate::atoms::constants::PLACEHOLDER_PREFIX;
use crate::atoms::error::CompletionError;
use crate::atoms::types::{GenerationConfig, Role, Turn};
use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

// ── Trait ──────────────────────────────────────────────────────────────────

/// The external service that, given conversational context, returns
/// generated text. The controller decides which slice of the transcript
/// to send.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, context: &[Turn]) -> Result<String, CompletionError>;
}

// ── Gemini client ──────────────────────────────────────────────────────────

pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    generation: GenerationConfig,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        generation: GenerationConfig,
    ) -> Self {
        GeminiClient {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            generation,
        }
    }

    pub fn from_config(config: &crate::engine::config::CompletionConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            config.api_key.clone(),
            config.generation.clone(),
        )
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}

/// Build the `generateContent` request body. The assistant role is `model`
/// on the wire; every turn becomes one `contents` entry with a single text
/// part.
pub fn build_request_body(context: &[Turn], generation: &GenerationConfig) -> Value {
    let contents: Vec<Value> = context
        .iter()
        .map(|t| {
            let role = match t.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            json!({
                "role": role,
                "parts": [{"text": t.text}]
            })
        })
        .collect();

    json!({
        "contents": contents,
        "generationConfig": generation,
    })
}

/// Success path: `candidates[0].content.parts[0].text`.
pub fn extract_text(body: &Value) -> Option<String> {
    body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(|s| s.to_string())
}

/// Error envelope: `error.message` when present, else a generic marker.
pub fn extract_error_message(body: &Value) -> String {
    body["error"]["message"]
        .as_str()
        .unwrap_or("API Error")
        .to_string()
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, context: &[Turn]) -> Result<String, CompletionError> {
        // Config check first: never hit the network with a placeholder key.
        let key = self.api_key.trim();
        if key.is_empty() || key.starts_with(PLACEHOLDER_PREFIX) {
            return Err(CompletionError::Config(
                "Set your completion API key in the config file before chatting".to_string(),
            ));
        }

        let body = build_request_body(context, &self.generation);
        info!(
            "[engine] Completion request model={} turns={}",
            self.model,
            context.len()
        );

        let response = self
            .client
            .post(self.endpoint_url())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let envelope: Value = response.json().await.unwrap_or(Value::Null);
            let message = extract_error_message(&envelope);
            error!("[engine] Completion error {}: {}", status.as_u16(), message);
            return Err(CompletionError::Api { status: status.as_u16(), message });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(format!("Invalid JSON body: {e}")))?;

        extract_text(&payload)
            .ok_or_else(|| CompletionError::Malformed("No candidate text in response".to_string()))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
