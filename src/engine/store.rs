// AiMan Engine — Conversation Store
// Ordered, capacity-bounded collection of conversations, most-recently-
// updated first. Loaded wholesale at startup and rewritten wholesale on
// every upsert — there is no incremental append format.

use crate::atoms::constants::{CONVERSATIONS_KEY, MAX_CONVERSATIONS, TITLE_ELLIPSIS, TITLE_MAX_CHARS};
use crate::atoms::error::CoreResult;
use crate::atoms::types::{Conversation, ConversationSummary, Turn};
use crate::engine::storage::StorageAdapter;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

pub struct ConversationStore {
    storage: Arc<dyn StorageAdapter>,
    conversations: Mutex<Vec<Conversation>>,
}

impl ConversationStore {
    /// Load the whole persisted collection. A corrupt payload is logged and
    /// treated as empty rather than blocking startup.
    pub fn open(storage: Arc<dyn StorageAdapter>) -> CoreResult<Self> {
        let conversations = match storage.get(CONVERSATIONS_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<Conversation>>(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!("[engine] Discarding unreadable conversation history: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        info!("[engine] Loaded {} conversation(s)", conversations.len());
        Ok(ConversationStore { storage, conversations: Mutex::new(conversations) })
    }

    /// Replace-or-insert a conversation at the front, then truncate to the
    /// capacity bound and persist the whole collection.
    pub fn upsert(&self, id: i64, title: &str, turns: &[Turn]) -> CoreResult<()> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut list = self.conversations.lock();

        // Updates move the entry to the front: position is the recency order.
        if let Some(pos) = list.iter().position(|c| c.id == id) {
            let mut conv = list.remove(pos);
            conv.messages = turns.to_vec();
            conv.timestamp = now_ms;
            list.insert(0, conv);
        } else {
            list.insert(
                0,
                Conversation {
                    id,
                    title: title.to_string(),
                    messages: turns.to_vec(),
                    timestamp: now_ms,
                },
            );
        }

        if list.len() > MAX_CONVERSATIONS {
            list.truncate(MAX_CONVERSATIONS);
        }

        let raw = serde_json::to_string(&*list)?;
        self.storage.set(CONVERSATIONS_KEY, &raw)
    }

    /// Sidebar entries, front-to-back = most-recently-updated first.
    pub fn list_summaries(&self) -> Vec<ConversationSummary> {
        self.conversations
            .lock()
            .iter()
            .map(|c| ConversationSummary { id: c.id, title: c.title.clone() })
            .collect()
    }

    /// Full turn sequence for rehydrating a transcript view.
    /// Empty if the id is absent — absence is not an error.
    pub fn load(&self, id: i64) -> Vec<Turn> {
        self.conversations
            .lock()
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.messages.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.conversations.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.lock().is_empty()
    }
}

/// Derive a conversation title from its first user message: stored as-is up
/// to 50 characters, cut and marked with `...` when longer.
pub fn derive_title(first_message: &str) -> String {
    let count = first_message.chars().count();
    if count > TITLE_MAX_CHARS {
        let cut: String = first_message.chars().take(TITLE_MAX_CHARS).collect();
        format!("{cut}{TITLE_ELLIPSIS}")
    } else {
        first_message.to_string()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::storage::MemoryStorage;

    fn store() -> ConversationStore {
        ConversationStore::open(Arc::new(MemoryStorage::new())).unwrap()
    }

    fn turns(text: &str) -> Vec<Turn> {
        vec![Turn::user(text), Turn::assistant("ok")]
    }

    #[test]
    fn upsert_inserts_at_front() {
        let s = store();
        s.upsert(1, "first", &turns("a")).unwrap();
        s.upsert(2, "second", &turns("b")).unwrap();
        let ids: Vec<i64> = s.list_summaries().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn updating_moves_to_front_and_replaces_turns() {
        let s = store();
        s.upsert(1, "first", &turns("a")).unwrap();
        s.upsert(2, "second", &turns("b")).unwrap();
        let updated = vec![Turn::user("a"), Turn::assistant("ok"), Turn::user("more")];
        s.upsert(1, "first", &updated).unwrap();

        let ids: Vec<i64> = s.list_summaries().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(s.load(1), updated);
    }

    #[test]
    fn capacity_evicts_least_recently_updated() {
        let s = store();
        for i in 1..=20 {
            s.upsert(i, &format!("c{i}"), &turns("x")).unwrap();
        }
        assert_eq!(s.len(), 20);

        // 21st distinct insert drops exactly the back entry (id 1).
        s.upsert(21, "c21", &turns("x")).unwrap();
        assert_eq!(s.len(), 20);
        let ids: Vec<i64> = s.list_summaries().iter().map(|c| c.id).collect();
        assert_eq!(ids[0], 21);
        assert!(!ids.contains(&1));
        assert!(ids.contains(&2));
    }

    #[test]
    fn load_absent_id_is_empty() {
        let s = store();
        assert!(s.load(999).is_empty());
    }

    #[test]
    fn persists_wholesale_and_reloads() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let s = ConversationStore::open(storage.clone()).unwrap();
            s.upsert(7, "hello", &turns("hello")).unwrap();
        }
        let s = ConversationStore::open(storage).unwrap();
        assert_eq!(s.list_summaries(), vec![ConversationSummary { id: 7, title: "hello".into() }]);
        assert_eq!(s.load(7), turns("hello"));
    }

    #[test]
    fn corrupt_payload_treated_as_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(CONVERSATIONS_KEY, "not json").unwrap();
        let s = ConversationStore::open(storage).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn title_at_limit_stored_as_is() {
        let exactly_50 = "a".repeat(50);
        assert_eq!(derive_title(&exactly_50), exactly_50);
    }

    #[test]
    fn title_over_limit_truncated_with_ellipsis() {
        let fifty_one = "b".repeat(51);
        let title = derive_title(&fifty_one);
        assert_eq!(title, format!("{}...", "b".repeat(50)));
        assert_eq!(title.chars().count(), 53);
    }
}
