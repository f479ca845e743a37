// AiMan Engine — Auth Gate & Identity Provider
// The gate is a pure decision over (stored identity, requested view),
// evaluated once per view load. The identity provider is an external
// collaborator behind a trait; the bundled client speaks the Identity
// Toolkit REST surface for password create/sign-in. Interactive popup
// flows live entirely provider-side.

use crate::atoms::error::AuthError;
use crate::atoms::types::{RouteDecision, UserIdentity, View};
use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

// ── Gate ───────────────────────────────────────────────────────────────────

/// Decide whether the requested view may be entered. Identity absent +
/// authenticated view → auth; identity present + auth view → chat.
pub fn route(identity: Option<&UserIdentity>, requested: View) -> RouteDecision {
    match (identity, requested) {
        (None, View::Chat) => RouteDecision::RedirectToAuth,
        (Some(_), View::Auth) => RouteDecision::RedirectToChat,
        _ => RouteDecision::Stay,
    }
}

// ── Error-code mapping ─────────────────────────────────────────────────────

/// Fixed lookup from SDK-style provider codes to user-facing text,
/// displayed inline near the auth form. Unknown codes fall back to the
/// generic message.
pub fn user_message(code: &str) -> &'static str {
    match code {
        "email-already-in-use" => "An account with this email already exists",
        "invalid-email" => "That email address doesn't look right",
        "user-not-found" => "No account found for this email",
        "wrong-password" => "Incorrect password",
        "weak-password" => "Password is too weak — use at least 6 characters",
        "network-request-failed" => "Network problem — check your connection and try again",
        "popup-closed-by-user" => "Sign-in window was closed before finishing",
        "too-many-requests" => "Too many attempts — please wait a moment and try again",
        _ => "Something went wrong — please try again",
    }
}

// ── Provider trait ─────────────────────────────────────────────────────────

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Password sign-in for an existing account.
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError>;

    /// Password account creation (reached only through a validated
    /// verification attempt).
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<UserIdentity, AuthError>;
}

// ── Identity Toolkit REST client ───────────────────────────────────────────

pub struct RestIdentityProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

impl RestIdentityProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_IDENTITY_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        RestIdentityProvider {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn call(&self, action: &str, body: Value) -> Result<Value, AuthError> {
        let url = format!(
            "{}/accounts:{}?key={}",
            self.base_url.trim_end_matches('/'),
            action,
            self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AuthError::new("network-request-failed", format!("HTTP request failed: {e}"))
            })?;

        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let raw = payload["error"]["message"].as_str().unwrap_or("UNKNOWN");
            let code = map_provider_code(raw);
            error!("[engine] Identity provider error {}: {}", status.as_u16(), raw);
            return Err(AuthError::new(code, raw.to_string()));
        }

        Ok(payload)
    }
}

/// Map raw REST error identifiers to the SDK-style codes the message table
/// understands. The raw value may carry a trailing explanation
/// (`"WEAK_PASSWORD : Password should be…"`), so match on the head token.
pub fn map_provider_code(raw: &str) -> String {
    let head = raw.split(&[' ', ':'][..]).next().unwrap_or(raw);
    match head {
        "EMAIL_EXISTS" => "email-already-in-use",
        "INVALID_EMAIL" | "MISSING_EMAIL" => "invalid-email",
        "EMAIL_NOT_FOUND" => "user-not-found",
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => "wrong-password",
        "WEAK_PASSWORD" | "MISSING_PASSWORD" => "weak-password",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "too-many-requests",
        other => return other.to_lowercase().replace('_', "-"),
    }
    .to_string()
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        let payload = self
            .call(
                "signInWithPassword",
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        info!("[engine] Signed in {}", email);
        Ok(UserIdentity {
            uid: payload["localId"].as_str().unwrap_or_default().to_string(),
            name: payload["displayName"]
                .as_str()
                .filter(|s| !s.is_empty())
                .unwrap_or(email)
                .to_string(),
            email: payload["email"].as_str().unwrap_or(email).to_string(),
            photo: payload["profilePicture"]
                .as_str()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
        })
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<UserIdentity, AuthError> {
        let payload = self
            .call(
                "signUp",
                json!({
                    "email": email,
                    "password": password,
                    "displayName": name,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        info!("[engine] Created account for {}", email);
        Ok(UserIdentity {
            uid: payload["localId"].as_str().unwrap_or_default().to_string(),
            name: name.to_string(),
            email: payload["email"].as_str().unwrap_or(email).to_string(),
            photo: None,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
