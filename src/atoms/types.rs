// ── AiMan Atoms: Pure Data Types ───────────────────────────────────────────
// All plain struct/enum definitions with no logic.
// Atoms layer rule: no I/O, no side effects, no imports from engine/.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Identity ───────────────────────────────────────────────────────────────

/// The signed-in user, held for the session's lifetime and persisted under
/// its own storage key. Cleared on logout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserIdentity {
    pub uid: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

// ── Conversation turns ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message exchange unit. Immutable once appended to a transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn { role: Role::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Turn { role: Role::Assistant, text: text.into() }
    }
}

// ── Conversations ──────────────────────────────────────────────────────────

/// A persisted chat session. `id` is the creation timestamp in ms since
/// epoch (unique per session); `timestamp` is last-modified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    pub messages: Vec<Turn>,
    pub timestamp: i64,
}

/// Sidebar listing entry, front-to-back = most-recently-updated first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummary {
    pub id: i64,
    pub title: String,
}

// ── Verification ───────────────────────────────────────────────────────────

/// The transient record tracking an in-progress email-code challenge.
/// At most one attempt is pending at a time; a new issue replaces it.
#[derive(Debug, Clone)]
pub struct VerificationAttempt {
    pub email: String,
    pub name: String,
    pub password: String,
    /// Four ASCII digits, 1000–9999. Only the latest issued code is valid.
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Credentials handed downstream when an attempt validates. Consuming them
/// creates the `UserIdentity` via the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationDetails {
    pub email: String,
    pub name: String,
    pub password: String,
}

// ── Completion request shaping ─────────────────────────────────────────────

/// Which context the completion request carries. Fixed per deployment;
/// mixing modes mid-session would silently change model context length.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    /// Entire transcript-so-far on every request.
    #[default]
    FullHistory,
    /// Only the latest user message.
    SingleTurn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f64,
    #[serde(rename = "topK")]
    pub top_k: u32,
    #[serde(rename = "topP")]
    pub top_p: f64,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        use crate::atoms::constants::*;
        GenerationConfig {
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
            top_p: DEFAULT_TOP_P,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

// ── Routing ────────────────────────────────────────────────────────────────

/// Views the rendering layer can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Auth,
    Chat,
}

/// Outcome of the auth gate for a requested view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Stay,
    RedirectToAuth,
    RedirectToChat,
}
