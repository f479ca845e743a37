// AiMan Engine — Chat Turn Controller
// Orchestrates one request/response cycle against the completion endpoint.
// Ordering contract: the user turn is appended before the network call is
// issued, and the assistant turn (or the fixed apology) strictly after the
// call settles. The busy flag mirrors the UI's disabled send affordance —
// it is the sole concurrency guard, not a true lock, and is released
// unconditionally when the call settles.

use crate::atoms::constants::APOLOGY_TEXT;
use crate::atoms::error::CoreResult;
use crate::atoms::types::{ContextMode, Role, Turn};
use crate::engine::completion::CompletionClient;
use crate::engine::store::{derive_title, ConversationStore};
use log::{error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ── Active transcript ──────────────────────────────────────────────────────

/// The single in-memory transcript the user is currently typing into.
/// Created fresh on "new chat", rehydrated from the store when an entry in
/// the sidebar is opened.
#[derive(Debug)]
pub struct ActiveConversation {
    pub id: i64,
    pub turns: Vec<Turn>,
}

impl ActiveConversation {
    /// Fresh session; the creation timestamp doubles as the unique id.
    pub fn new() -> Self {
        ActiveConversation { id: chrono::Utc::now().timestamp_millis(), turns: Vec::new() }
    }

    pub fn rehydrated(id: i64, turns: Vec<Turn>) -> Self {
        ActiveConversation { id, turns }
    }

    /// First user message, for title derivation. The protocol guarantees
    /// transcripts start with a user turn.
    fn first_user_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .find(|t| t.role == Role::User)
            .map(|t| t.text.as_str())
    }
}

impl Default for ActiveConversation {
    fn default() -> Self {
        Self::new()
    }
}

// ── Controller ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Input was empty after trimming — no state change, no network call.
    Ignored,
    /// Another request is still outstanding for this controller.
    Busy,
    /// Assistant reply appended and the conversation persisted.
    Replied,
    /// Completion failed; the fixed apology turn was appended and nothing
    /// was persisted beyond what the transcript already held.
    Apologized,
}

pub struct ChatTurnController {
    completion: Arc<dyn CompletionClient>,
    mode: ContextMode,
    busy: AtomicBool,
}

impl ChatTurnController {
    pub fn new(completion: Arc<dyn CompletionClient>, mode: ContextMode) -> Self {
        ChatTurnController { completion, mode, busy: AtomicBool::new(false) }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub async fn send_turn(
        &self,
        store: &ConversationStore,
        active: &mut ActiveConversation,
        text: &str,
    ) -> CoreResult<TurnOutcome> {
        let message = text.trim();
        if message.is_empty() {
            return Ok(TurnOutcome::Ignored);
        }

        if self.busy.swap(true, Ordering::SeqCst) {
            return Ok(TurnOutcome::Busy);
        }

        // The user's input lands in the transcript before any network
        // activity, whatever the outcome of the call.
        active.turns.push(Turn::user(message));

        let context: &[Turn] = match self.mode {
            ContextMode::FullHistory => &active.turns,
            ContextMode::SingleTurn => &active.turns[active.turns.len() - 1..],
        };

        match self.completion.complete(context).await {
            Ok(reply) => {
                active.turns.push(Turn::assistant(reply));
                let title = derive_title(active.first_user_text().unwrap_or_default());
                let persisted = store.upsert(active.id, &title, &active.turns);
                self.busy.store(false, Ordering::SeqCst);
                persisted?;
                info!("[engine] Turn completed for conversation {}", active.id);
                Ok(TurnOutcome::Replied)
            }
            Err(e) => {
                // The raw error goes to the diagnostic channel only; the
                // transcript gets the fixed apology. No retry, no persist.
                error!("[engine] Completion failed: {}", e);
                active.turns.push(Turn::assistant(APOLOGY_TEXT));
                self.busy.store(false, Ordering::SeqCst);
                Ok(TurnOutcome::Apologized)
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
