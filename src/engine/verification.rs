// AiMan Engine — Verification State Machine
// Email-code challenge gating account creation:
//   idle → pending → { validated | expired | idle(cancelled) }
//
// At most one attempt is pending; a new issue replaces it. Only the latest
// issued code is ever accepted. The 1-second countdown is display-only —
// the authoritative expiry check runs inline at validation time, so a
// missed tick can never wrongly accept or reject a code.

use crate::atoms::constants::{CODE_MAX, CODE_MIN, CODE_TTL_SECS, COUNTDOWN_TICK_SECS};
use crate::atoms::error::VerificationError;
use crate::atoms::types::{RegistrationDetails, VerificationAttempt};
use crate::engine::mailer::CodeMailer;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{info, warn};
use rand::Rng;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Draw a code uniformly from 1000–9999. Four decimal digits; a leading
/// zero is impossible by construction.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(CODE_MIN..=CODE_MAX).to_string()
}

pub struct VerificationFlow {
    mailer: Arc<dyn CodeMailer>,
    product: String,
    attempt: Option<VerificationAttempt>,
}

impl VerificationFlow {
    pub fn new(mailer: Arc<dyn CodeMailer>, product: impl Into<String>) -> Self {
        VerificationFlow { mailer, product: product.into(), attempt: None }
    }

    pub fn is_pending(&self) -> bool {
        self.attempt.is_some()
    }

    /// Seconds left on the pending code, clamped at zero. Display only.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.attempt
            .as_ref()
            .map(|a| (a.expires_at - now).num_seconds().max(0))
    }

    // ── issue ──────────────────────────────────────────────────────────────

    /// `idle --issue--> pending`. Replaces any prior attempt. The attempt is
    /// held pending even when delivery fails — the failure is surfaced so
    /// the user can resend.
    pub async fn issue(
        &mut self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<(), VerificationError> {
        self.issue_at(email, name, password, generate_code(), Utc::now())
            .await
    }

    /// Clock-explicit variant of `issue` for callers that manage their own
    /// time source.
    pub async fn issue_at(
        &mut self,
        email: &str,
        name: &str,
        password: &str,
        code: String,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationError> {
        self.attempt = Some(VerificationAttempt {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
            code,
            issued_at: now,
            expires_at: now + ChronoDuration::seconds(CODE_TTL_SECS),
        });
        info!("[engine] Verification code issued for {}", email);
        self.dispatch().await
    }

    // ── resend ─────────────────────────────────────────────────────────────

    /// `pending --resend--> pending`. Regenerates code and expiry,
    /// preserving the identity fields. The previous code is invalidated
    /// immediately.
    pub async fn resend(&mut self) -> Result<(), VerificationError> {
        self.resend_at(generate_code(), Utc::now()).await
    }

    /// Clock-explicit variant of `resend`.
    pub async fn resend_at(
        &mut self,
        code: String,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationError> {
        let attempt = self.attempt.as_mut().ok_or(VerificationError::NothingPending)?;
        attempt.code = code;
        attempt.issued_at = now;
        attempt.expires_at = now + ChronoDuration::seconds(CODE_TTL_SECS);
        info!("[engine] Verification code reissued for {}", attempt.email);
        self.dispatch().await
    }

    async fn dispatch(&self) -> Result<(), VerificationError> {
        // Attempt is already stored: a delivery failure must not destroy it.
        let attempt = self.attempt.as_ref().ok_or(VerificationError::NothingPending)?;
        if let Err(e) = self
            .mailer
            .send_code(&attempt.email, &attempt.name, &attempt.code, &self.product)
            .await
        {
            warn!("[engine] Code delivery failed for {}: {}", attempt.email, e);
            return Err(VerificationError::Delivery(e));
        }
        Ok(())
    }

    // ── validate ───────────────────────────────────────────────────────────

    /// `pending --validate--> validated` iff the candidate matches the
    /// latest code AND `now <= expiry`. Success consumes the attempt and
    /// yields the stored credentials for identity creation. Mismatch and
    /// expiry both leave the attempt pending.
    pub fn validate(&mut self, candidate: &str) -> Result<RegistrationDetails, VerificationError> {
        self.validate_at(candidate, Utc::now())
    }

    /// Clock-explicit variant of `validate`. The comparison against
    /// `expires_at` here is the authoritative expiry check.
    pub fn validate_at(
        &mut self,
        candidate: &str,
        now: DateTime<Utc>,
    ) -> Result<RegistrationDetails, VerificationError> {
        let attempt = self.attempt.as_ref().ok_or(VerificationError::NothingPending)?;

        if now > attempt.expires_at {
            warn!("[engine] Verification rejected: code expired for {}", attempt.email);
            return Err(VerificationError::Expired);
        }

        // Digit filtering at entry time; beyond that the match is exact.
        let digits: String = candidate.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits != attempt.code {
            return Err(VerificationError::CodeMismatch);
        }

        // Consumed: no replay within the same attempt.
        let attempt = self.attempt.take().ok_or(VerificationError::NothingPending)?;
        info!("[engine] Verification succeeded for {}", attempt.email);
        Ok(RegistrationDetails {
            email: attempt.email,
            name: attempt.name,
            password: attempt.password,
        })
    }

    // ── cancel ─────────────────────────────────────────────────────────────

    /// `pending --cancel--> idle`. Discards the attempt unconditionally
    /// (modal dismissal). Any in-flight delivery result is simply ignored.
    pub fn cancel(&mut self) {
        if self.attempt.take().is_some() {
            info!("[engine] Verification attempt cancelled");
        }
    }
}

// ── Display countdown ──────────────────────────────────────────────────────

/// Repeating cooperative ticker for the modal's countdown display.
/// Cosmetic and non-authoritative; it must be stopped on modal close or
/// successful validation so it cannot outlive the attempt.
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Tick once per second with the clamped remaining seconds, then once
    /// with zero when the expiry passes, and stop.
    pub fn start<F>(expires_at: DateTime<Utc>, on_tick: F) -> Self
    where
        F: Fn(i64) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(COUNTDOWN_TICK_SECS));
            loop {
                interval.tick().await;
                let remaining = (expires_at - Utc::now()).num_seconds().max(0);
                on_tick(remaining);
                if remaining == 0 {
                    break;
                }
            }
        });
        Countdown { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
