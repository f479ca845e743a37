// End-to-end flows across the engine: registration gated by the email
// code, chat turns against a scripted completion endpoint, and the
// persisted conversation collection. All collaborators are mocks; no
// network is touched.

use aiman_core::engine::app::AppState;
use aiman_core::engine::auth::IdentityProvider;
use aiman_core::engine::chat::{ChatTurnController, TurnOutcome};
use aiman_core::engine::completion::CompletionClient;
use aiman_core::engine::mailer::CodeMailer;
use aiman_core::engine::storage::MemoryStorage;
use aiman_core::engine::store::ConversationStore;
use aiman_core::engine::verification::VerificationFlow;
use aiman_core::{
    AuthError, CompletionError, ContextMode, Role, RouteDecision, Turn, UserIdentity,
    VerificationError, View,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

// ── Mock collaborators ─────────────────────────────────────────────────────

struct RecordingMailer {
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl CodeMailer for RecordingMailer {
    async fn send_code(
        &self,
        _to_email: &str,
        _to_name: &str,
        code: &str,
        _product: &str,
    ) -> Result<(), String> {
        self.sent.lock().push(code.to_string());
        Ok(())
    }
}

struct ScriptedCompletion {
    reply: Option<String>,
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, _context: &[Turn]) -> Result<String, CompletionError> {
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(CompletionError::Transport("network down".into())),
        }
    }
}

struct StubProvider;

#[async_trait]
impl IdentityProvider for StubProvider {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<UserIdentity, AuthError> {
        Ok(UserIdentity { uid: "uid-1".into(), name: "Ada".into(), email: email.into(), photo: None })
    }

    async fn create_user(
        &self,
        email: &str,
        _password: &str,
        name: &str,
    ) -> Result<UserIdentity, AuthError> {
        Ok(UserIdentity { uid: "uid-2".into(), name: name.into(), email: email.into(), photo: None })
    }
}

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z").unwrap().with_timezone(&Utc)
}

// ── Verification → registration → chat ─────────────────────────────────────

#[tokio::test]
async fn code_4821_validates_at_599_but_not_601() {
    let mailer = Arc::new(RecordingMailer { sent: Mutex::new(Vec::new()) });
    let mut flow = VerificationFlow::new(mailer.clone(), "AiMan");

    // Issue "4821" for a@b.com at t=0; expiry is t+600s.
    flow.issue_at("a@b.com", "Ada", "hunter2", "4821".into(), t0()).await.unwrap();
    assert_eq!(*mailer.sent.lock(), vec!["4821"]);

    // t=599: success — credentials released, attempt cleared.
    let details = flow.validate_at("4821", t0() + Duration::seconds(599)).unwrap();
    assert_eq!(details.email, "a@b.com");
    assert!(!flow.is_pending());

    // Fresh attempt, same code, t=601: rejected as expired, not as mismatch.
    flow.issue_at("a@b.com", "Ada", "hunter2", "4821".into(), t0()).await.unwrap();
    assert_eq!(
        flow.validate_at("4821", t0() + Duration::seconds(601)),
        Err(VerificationError::Expired)
    );
}

#[tokio::test]
async fn registration_flow_creates_identity_and_opens_chat() {
    let storage = Arc::new(MemoryStorage::new());
    let mut app = AppState::open(storage).unwrap();
    assert_eq!(app.gate(View::Chat), RouteDecision::RedirectToAuth);

    let mailer = Arc::new(RecordingMailer { sent: Mutex::new(Vec::new()) });
    let mut flow = VerificationFlow::new(mailer.clone(), "AiMan");
    flow.issue("new@b.com", "Newt", "s3cret").await.unwrap();

    // The user types the code that was delivered.
    let delivered = mailer.sent.lock().last().unwrap().clone();
    let details = flow.validate(&delivered).unwrap();

    let decision = app.complete_registration(&StubProvider, details).await.unwrap();
    assert_eq!(decision, RouteDecision::RedirectToChat);
    assert_eq!(app.identity().unwrap().email, "new@b.com");
    assert_eq!(app.gate(View::Auth), RouteDecision::RedirectToChat);
}

// ── Chat turn cycles ───────────────────────────────────────────────────────

#[tokio::test]
async fn hello_turn_builds_transcript_and_title() {
    let storage = Arc::new(MemoryStorage::new());
    let store = ConversationStore::open(storage).unwrap();
    let controller = ChatTurnController::new(
        Arc::new(ScriptedCompletion { reply: Some("Hi there".into()) }),
        ContextMode::FullHistory,
    );
    let mut app = AppState::open(Arc::new(MemoryStorage::new())).unwrap();

    let outcome = controller.send_turn(&store, &mut app.active, "Hello").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Replied);
    assert_eq!(
        app.active.turns,
        vec![Turn::user("Hello"), Turn::assistant("Hi there")]
    );

    let summaries = store.list_summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].title, "Hello");
}

#[tokio::test]
async fn network_failure_yields_apology_and_no_persisted_state() {
    let storage = Arc::new(MemoryStorage::new());
    let store = ConversationStore::open(storage).unwrap();
    let controller = ChatTurnController::new(
        Arc::new(ScriptedCompletion { reply: None }),
        ContextMode::FullHistory,
    );
    let mut app = AppState::open(Arc::new(MemoryStorage::new())).unwrap();

    let outcome = controller.send_turn(&store, &mut app.active, "Hello").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Apologized);

    assert_eq!(app.active.turns.len(), 2);
    assert_eq!(app.active.turns[0], Turn::user("Hello"));
    assert_eq!(app.active.turns[1].role, Role::Assistant);
    // The fixed apology, never a partial or raw error payload.
    assert!(app.active.turns[1].text.starts_with("Sorry"));
    assert!(store.is_empty());
}

// ── Persistence across restart + capacity ──────────────────────────────────

#[tokio::test]
async fn conversations_survive_restart_and_respect_capacity() {
    let storage = Arc::new(MemoryStorage::new());
    let controller = ChatTurnController::new(
        Arc::new(ScriptedCompletion { reply: Some("ok".into()) }),
        ContextMode::FullHistory,
    );

    {
        let store = ConversationStore::open(storage.clone()).unwrap();
        let mut app = AppState::open(storage.clone()).unwrap();
        for i in 0..21 {
            app.new_chat();
            // Distinct ids even within one millisecond.
            app.active.id = 1000 + i;
            controller
                .send_turn(&store, &mut app.active, &format!("message {i}"))
                .await
                .unwrap();
        }
    }

    // Restart: collection reloads wholesale, bounded at 20, first insert
    // evicted, newest in front.
    let store = ConversationStore::open(storage).unwrap();
    let summaries = store.list_summaries();
    assert_eq!(summaries.len(), 20);
    assert_eq!(summaries[0].title, "message 20");
    assert!(!summaries.iter().any(|s| s.title == "message 0"));

    // Rehydrating a surviving conversation restores its turns.
    let turns = store.load(summaries[0].id);
    assert_eq!(turns, vec![Turn::user("message 20"), Turn::assistant("ok")]);
}

#[tokio::test]
async fn logout_then_gate_blocks_chat_again() {
    let storage = Arc::new(MemoryStorage::new());
    let mut app = AppState::open(storage.clone()).unwrap();
    app.sign_in(&StubProvider, "a@b.com", "pw").await.unwrap();
    assert_eq!(app.gate(View::Chat), RouteDecision::Stay);

    assert_eq!(app.logout(), RouteDecision::RedirectToAuth);
    assert_eq!(app.gate(View::Chat), RouteDecision::RedirectToAuth);

    // And the cleared identity does not resurrect on restart.
    let reopened = AppState::open(storage).unwrap();
    assert!(reopened.identity().is_none());
}
