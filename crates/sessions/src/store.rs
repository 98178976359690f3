//! The session store contract and its in-memory baseline.

use std::collections::HashMap;

use adk_domain::error::{Error, Result};
use adk_domain::{Event, RequestScope, Session, SessionKey};
use async_trait::async_trait;
use parking_lot::RwLock;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Contract
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// CRUD over `(app, user, session) → session{events}`.
///
/// `get_session` takes the per-request [`RequestScope`] because the
/// decorators' read behavior is request-dependent (context limit, retry
/// shrink factor, summarizer model override). The baseline ignores it.
///
/// `replace_events` is the narrow write-back capability the compacting
/// decorator uses instead of reaching into the store's internals. Stores
/// that decline it (`events_mutable() == false`) force decorators into
/// pure copy-on-read layering; both behaviors are part of the contract.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session. Fails with `AlreadyExists` on a duplicate triple.
    async fn create_session(
        &self,
        key: &SessionKey,
        state: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Session>;

    /// Fetch a session. Fails with `NotFound` when missing.
    async fn get_session(&self, key: &SessionKey, scope: &RequestScope) -> Result<Session>;

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>>;

    async fn delete_session(&self, key: &SessionKey) -> Result<()>;

    /// Append one event. The only mutation path for event history.
    async fn append_event(&self, key: &SessionKey, event: Event) -> Result<Event>;

    /// Whether `replace_events` reaches authoritative storage.
    fn events_mutable(&self) -> bool {
        false
    }

    /// Atomically replace a session's event list. Implementations that
    /// report `events_mutable() == false` return `Unsupported`-style
    /// errors; callers must check first.
    fn replace_events(&self, key: &SessionKey, events: Vec<Event>) -> Result<()>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory baseline
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

type SessionMap = HashMap<String, HashMap<String, HashMap<String, Session>>>;

/// The baseline store: nested maps `app → user → session_id → session`,
/// guarded by one `RwLock`. Every operation clones on the way out — the
/// store exclusively owns its event lists.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<SessionMap>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(
        &self,
        key: &SessionKey,
        state: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Session> {
        let mut sessions = self.sessions.write();
        let user_sessions = sessions
            .entry(key.app_name.clone())
            .or_default()
            .entry(key.user_id.clone())
            .or_default();

        if user_sessions.contains_key(&key.session_id) {
            return Err(Error::AlreadyExists(key.to_string()));
        }

        let session = Session {
            app_name: key.app_name.clone(),
            user_id: key.user_id.clone(),
            id: key.session_id.clone(),
            state,
            events: Vec::new(),
        };
        user_sessions.insert(key.session_id.clone(), session.clone());

        tracing::info!(session = %key, "session created");
        Ok(session)
    }

    async fn get_session(&self, key: &SessionKey, _scope: &RequestScope) -> Result<Session> {
        self.sessions
            .read()
            .get(&key.app_name)
            .and_then(|u| u.get(&key.user_id))
            .and_then(|s| s.get(&key.session_id))
            .cloned()
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        Ok(self
            .sessions
            .read()
            .get(app_name)
            .and_then(|u| u.get(user_id))
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_session(&self, key: &SessionKey) -> Result<()> {
        let mut sessions = self.sessions.write();
        let removed = sessions
            .get_mut(&key.app_name)
            .and_then(|u| u.get_mut(&key.user_id))
            .and_then(|s| s.remove(&key.session_id));

        match removed {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(key.to_string())),
        }
    }

    async fn append_event(&self, key: &SessionKey, event: Event) -> Result<Event> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&key.app_name)
            .and_then(|u| u.get_mut(&key.user_id))
            .and_then(|s| s.get_mut(&key.session_id))
            .ok_or_else(|| Error::NotFound(key.to_string()))?;

        session.events.push(event.clone());
        Ok(event)
    }

    fn events_mutable(&self) -> bool {
        true
    }

    fn replace_events(&self, key: &SessionKey, events: Vec<Event>) -> Result<()> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&key.app_name)
            .and_then(|u| u.get_mut(&key.user_id))
            .and_then(|s| s.get_mut(&key.session_id))
            .ok_or_else(|| Error::NotFound(key.to_string()))?;

        session.events = events;
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use adk_domain::event::{Content, Part};

    fn key() -> SessionKey {
        SessionKey::new("adk_chat", "u1", "s1")
    }

    fn event(id: &str, ts: f64) -> Event {
        Event {
            id: id.into(),
            invocation_id: "inv".into(),
            author: "user".into(),
            timestamp: ts,
            content: Some(Content {
                role: "user".into(),
                parts: vec![Part::Text(format!("event {id}"))],
            }),
            actions: None,
            error_message: None,
        }
    }

    #[tokio::test]
    async fn create_get_round_trip() {
        let store = InMemorySessionStore::new();
        store.create_session(&key(), Default::default()).await.unwrap();

        let session = store.get_session(&key(), &RequestScope::default()).await.unwrap();
        assert_eq!(session.app_name, "adk_chat");
        assert_eq!(session.id, "s1");
        assert!(session.events.is_empty());
    }

    #[tokio::test]
    async fn duplicate_create_fails() {
        let store = InMemorySessionStore::new();
        store.create_session(&key(), Default::default()).await.unwrap();
        let err = store.create_session(&key(), Default::default()).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let store = InMemorySessionStore::new();
        let err = store.get_session(&key(), &RequestScope::default()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(matches!(
            store.delete_session(&key()).await.unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(matches!(
            store.append_event(&key(), event("e", 1.0)).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn append_preserves_order() {
        let store = InMemorySessionStore::new();
        store.create_session(&key(), Default::default()).await.unwrap();
        for i in 0..5 {
            store.append_event(&key(), event(&format!("e{i}"), i as f64)).await.unwrap();
        }

        let session = store.get_session(&key(), &RequestScope::default()).await.unwrap();
        let ids: Vec<&str> = session.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e0", "e1", "e2", "e3", "e4"]);
        assert!(session
            .events
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn replace_events_swaps_the_list_atomically() {
        let store = InMemorySessionStore::new();
        store.create_session(&key(), Default::default()).await.unwrap();
        store.append_event(&key(), event("old", 1.0)).await.unwrap();

        assert!(store.events_mutable());
        store.replace_events(&key(), vec![event("new", 2.0)]).unwrap();

        let session = store.get_session(&key(), &RequestScope::default()).await.unwrap();
        assert_eq!(session.events.len(), 1);
        assert_eq!(session.events[0].id, "new");
    }

    #[tokio::test]
    async fn returned_sessions_are_copies() {
        let store = InMemorySessionStore::new();
        store.create_session(&key(), Default::default()).await.unwrap();
        store.append_event(&key(), event("e0", 1.0)).await.unwrap();

        let mut copy = store.get_session(&key(), &RequestScope::default()).await.unwrap();
        copy.events.clear();

        let fresh = store.get_session(&key(), &RequestScope::default()).await.unwrap();
        assert_eq!(fresh.events.len(), 1);
    }

    #[tokio::test]
    async fn list_and_delete() {
        let store = InMemorySessionStore::new();
        let k2 = SessionKey::new("adk_chat", "u1", "s2");
        store.create_session(&key(), Default::default()).await.unwrap();
        store.create_session(&k2, Default::default()).await.unwrap();

        let listed = store.list_sessions("adk_chat", "u1").await.unwrap();
        assert_eq!(listed.len(), 2);

        store.delete_session(&key()).await.unwrap();
        let listed = store.list_sessions("adk_chat", "u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "s2");
    }
}
