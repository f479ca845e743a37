// AiMan Engine — Application State
// The explicit session-state object the rendering layer drives: current
// identity (persisted under its own key), the active transcript, and the
// forced redirects around login, registration, and logout. Created on
// view entry, torn down on view exit — no module-level state.

use crate::atoms::constants::IDENTITY_KEY;
use crate::atoms::error::{AuthError, CoreResult};
use crate::atoms::types::{RegistrationDetails, RouteDecision, UserIdentity, View};
use crate::engine::auth::{route, IdentityProvider};
use crate::engine::chat::ActiveConversation;
use crate::engine::storage::StorageAdapter;
use crate::engine::store::ConversationStore;
use log::{info, warn};
use std::sync::Arc;

pub struct AppState {
    storage: Arc<dyn StorageAdapter>,
    identity: Option<UserIdentity>,
    pub active: ActiveConversation,
}

impl AppState {
    /// Restore the session from storage. A corrupt identity payload is
    /// discarded — the user just signs in again.
    pub fn open(storage: Arc<dyn StorageAdapter>) -> CoreResult<Self> {
        let identity = match storage.get(IDENTITY_KEY)? {
            Some(raw) => match serde_json::from_str::<UserIdentity>(&raw) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("[engine] Discarding unreadable stored identity: {}", e);
                    None
                }
            },
            None => None,
        };
        Ok(AppState { storage, identity, active: ActiveConversation::new() })
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    /// Evaluate the auth gate for a requested view. Called once per view
    /// load; not re-evaluated reactively within a session.
    pub fn gate(&self, requested: View) -> RouteDecision {
        route(self.identity.as_ref(), requested)
    }

    // ── Sign-in / registration / logout ────────────────────────────────────

    pub async fn sign_in(
        &mut self,
        provider: &dyn IdentityProvider,
        email: &str,
        password: &str,
    ) -> Result<RouteDecision, AuthError> {
        let identity = provider.sign_in(email, password).await?;
        self.install_identity(identity);
        Ok(RouteDecision::RedirectToChat)
    }

    /// Finish registration with credentials released by a validated
    /// verification attempt.
    pub async fn complete_registration(
        &mut self,
        provider: &dyn IdentityProvider,
        details: RegistrationDetails,
    ) -> Result<RouteDecision, AuthError> {
        let identity = provider
            .create_user(&details.email, &details.password, &details.name)
            .await?;
        self.install_identity(identity);
        Ok(RouteDecision::RedirectToChat)
    }

    fn install_identity(&mut self, identity: UserIdentity) {
        info!("[engine] Session identity set for {}", identity.email);
        // Persistence failure is not fatal: the session stays signed in,
        // it just won't survive a restart.
        match serde_json::to_string(&identity) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(IDENTITY_KEY, &raw) {
                    warn!("[engine] Could not persist identity: {}", e);
                }
            }
            Err(e) => warn!("[engine] Could not serialize identity: {}", e),
        }
        self.identity = Some(identity);
    }

    pub fn logout(&mut self) -> RouteDecision {
        self.identity = None;
        if let Err(e) = self.storage.remove(IDENTITY_KEY) {
            warn!("[engine] Could not clear stored identity: {}", e);
        }
        info!("[engine] Logged out");
        RouteDecision::RedirectToAuth
    }

    // ── Active transcript management ───────────────────────────────────────

    /// Start a fresh session with a new creation-timestamp id. Persisted
    /// history is untouched.
    pub fn new_chat(&mut self) {
        self.active = ActiveConversation::new();
    }

    /// Wipe the current transcript but keep the session id: the next send
    /// re-saves the same conversation with the new content.
    pub fn clear_chat(&mut self) {
        self.active.turns.clear();
    }

    /// Rehydrate a stored conversation into the active transcript. Absent
    /// ids rehydrate as empty, per the store's load contract.
    pub fn open_conversation(&mut self, store: &ConversationStore, id: i64) {
        self.active = ActiveConversation::rehydrated(id, store.load(id));
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
