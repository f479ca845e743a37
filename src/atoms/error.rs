// ── AiMan Atoms: Error Types ───────────────────────────────────────────────
// Canonical error enums for the crate, built with `thiserror`.
//
// Design rules:
//   • `CoreError` variants are coarse-grained by domain (I/O, DB, network,
//     config…) with `#[from]` wiring for std/external conversions.
//   • Recoverable domain failures get their own enums (`VerificationError`,
//     `CompletionError`, `AuthError`) so callers can branch on them.
//   • No variant carries secret material (API keys, passwords, codes) in
//     its message.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CoreError {
    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP / network failure (reqwest layer).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// SQLite / rusqlite storage failure.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// TOML config parse failure.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration is invalid or missing (placeholder credentials, etc.).
    /// The message is instructional and shown to the user verbatim.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// All engine operations that can fail on infrastructure return this type.
pub type CoreResult<T> = Result<T, CoreError>;

// ── Completion endpoint errors ─────────────────────────────────────────────
// Shape follows the provider-error split used by the chat engine: config
// problems are detected before any network call, transport problems are
// thrown connections, API problems carry the endpoint's status and the
// `error.message` from its JSON envelope when present.

#[derive(Debug, Error)]
pub enum CompletionError {
    /// Missing or placeholder API credential — detected pre-network.
    #[error("{0}")]
    Config(String),

    /// Connection-level failure (DNS, TLS, timeout…).
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-success HTTP status from the endpoint.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// 2xx response whose body did not carry generated text.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

// ── Verification errors ────────────────────────────────────────────────────
// All recoverable: mismatch re-prompts, expiry requires a resend, delivery
// failure leaves the attempt pending for retry.

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    /// Candidate did not match the latest issued code. Attempt stays
    /// pending; entered digits should be cleared.
    #[error("The code you entered is incorrect")]
    CodeMismatch,

    /// Current time is past the attempt's expiry. Only `resend` recovers.
    #[error("This code has expired — request a new one")]
    Expired,

    /// No attempt is pending (never issued, cancelled, or already consumed).
    #[error("No verification in progress")]
    NothingPending,

    /// The email collaborator reported a delivery failure. The attempt is
    /// still held pending so the user can resend.
    #[error("Could not deliver the code: {0}")]
    Delivery(String),
}

// ── Identity provider errors ───────────────────────────────────────────────

/// Provider-reported failure. `code` is the SDK-style error code
/// (`email-already-in-use`, `wrong-password`, …); `user_message()` on the
/// auth module maps it to display text.
#[derive(Debug, Error)]
#[error("Auth error [{code}]: {message}")]
pub struct AuthError {
    pub code: String,
    pub message: String,
}

impl AuthError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        AuthError { code: code.into(), message: message.into() }
    }
}
