// AiMan Engine — Configuration
// TOML config deserialized with serde, one section per external
// collaborator. Placeholder credentials (empty or still carrying the
// template prefix) are rejected before any network call is attempted.

use crate::atoms::constants::*;
use crate::atoms::error::{CoreError, CoreResult};
use crate::atoms::types::{ContextMode, GenerationConfig};
use serde::Deserialize;
use std::path::Path;

// ── Sections ───────────────────────────────────────────────────────────────

/// `[completion]` — the hosted LLM endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub context_mode: ContextMode,
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// `[email]` — the transactional-email service (EmailJS wire contract).
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub public_key: String,
    pub service_id: String,
    pub template_id: String,
    #[serde(default = "default_product")]
    pub product_name: String,
}

/// `[identity]` — the identity provider's REST credential.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub completion: CompletionConfig,
    pub email: EmailConfig,
    pub identity: IdentityConfig,
}

fn default_model() -> String {
    DEFAULT_COMPLETION_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_COMPLETION_BASE_URL.to_string()
}

fn default_product() -> String {
    PRODUCT_NAME.to_string()
}

// ── Loading & validation ───────────────────────────────────────────────────

impl AppConfig {
    pub fn load(path: &Path) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> CoreResult<Self> {
        let config: AppConfig = toml::from_str(raw)?;
        Ok(config)
    }
}

/// A credential is usable only if it is non-empty and no longer carries the
/// template placeholder prefix.
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.starts_with(PLACEHOLDER_PREFIX)
}

/// Pre-network credential check. The message is instructional and shown to
/// the user verbatim.
pub fn require_credential(value: &str, hint: &str) -> Result<(), CoreError> {
    if is_placeholder(value) {
        return Err(CoreError::Config(format!(
            "Missing API credential: {hint}"
        )));
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
[completion]
api_key = "AIzaSyExample"
model = "gemini-pro"
context_mode = "single_turn"

[completion.generation]
temperature = 0.5
topK = 2
topP = 0.9
maxOutputTokens = 1024

[email]
public_key = "pk_123"
service_id = "service_abc"
template_id = "template_xyz"

[identity]
api_key = "AIzaSyIdentity"
"#;

    const MINIMAL_CONFIG: &str = r#"
[completion]
api_key = "AIzaSyExample"

[email]
public_key = "pk_123"
service_id = "service_abc"
template_id = "template_xyz"

[identity]
api_key = "AIzaSyIdentity"
"#;

    #[test]
    fn parses_full_config() {
        let c = AppConfig::parse(FULL_CONFIG).unwrap();
        assert_eq!(c.completion.context_mode, ContextMode::SingleTurn);
        assert_eq!(c.completion.generation.top_k, 2);
        assert_eq!(c.email.product_name, PRODUCT_NAME);
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let c = AppConfig::parse(MINIMAL_CONFIG).unwrap();
        assert_eq!(c.completion.model, DEFAULT_COMPLETION_MODEL);
        assert_eq!(c.completion.base_url, DEFAULT_COMPLETION_BASE_URL);
        assert_eq!(c.completion.context_mode, ContextMode::FullHistory);
        assert_eq!(c.completion.generation.max_output_tokens, 2048);
    }

    #[test]
    fn placeholder_detection() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("   "));
        assert!(is_placeholder("YOUR_GEMINI_API_KEY"));
        assert!(!is_placeholder("AIzaSyReal"));
        assert!(require_credential("YOUR_KEY", "set completion.api_key").is_err());
    }
}
