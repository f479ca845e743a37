// AiMan Engine — Code Delivery
// Transactional-email collaborator for verification codes. The contract
// is success/failure only; template rendering happens service-side from
// the submitted params (EmailJS wire format).

use crate::atoms::constants::EMAILJS_SEND_URL;
use crate::engine::config::EmailConfig;
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

// ── Trait ──────────────────────────────────────────────────────────────────

/// Delivers a one-time verification code to a recipient.
#[async_trait]
pub trait CodeMailer: Send + Sync {
    async fn send_code(
        &self,
        to_email: &str,
        to_name: &str,
        code: &str,
        product: &str,
    ) -> Result<(), String>;
}

// ── EmailJS client ─────────────────────────────────────────────────────────

pub struct EmailJsMailer {
    client: Client,
    send_url: String,
    config: EmailConfig,
}

impl EmailJsMailer {
    pub fn new(config: EmailConfig) -> Self {
        EmailJsMailer {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            send_url: EMAILJS_SEND_URL.to_string(),
            config,
        }
    }

    #[cfg(test)]
    fn with_send_url(mut self, url: impl Into<String>) -> Self {
        self.send_url = url.into();
        self
    }
}

#[async_trait]
impl CodeMailer for EmailJsMailer {
    async fn send_code(
        &self,
        to_email: &str,
        to_name: &str,
        code: &str,
        product: &str,
    ) -> Result<(), String> {
        let body = json!({
            "service_id": self.config.service_id,
            "template_id": self.config.template_id,
            "user_id": self.config.public_key,
            "template_params": {
                "to_email": to_email,
                "to_name": to_name,
                "code": code,
                "product": product,
            }
        });

        info!("[engine] Dispatching verification code to {}", to_email);

        let response = self
            .client
            .post(&self.send_url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Email dispatch failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!("[engine] Email service returned {}", status);
            return Err(format!("Email service error {status}"));
        }

        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
