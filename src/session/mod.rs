//! Authenticated session model and the persistence seam.
//!
//! A `Session` is the identity retained in memory after a successful login
//! and persisted so a restart can restore it without a directory round-trip.
//! The store holds at most one serialized session; the auth machine is its
//! only writer and reads it exactly once, at restore time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod store;

pub use store::SqliteSessionStore;

/// Wire/store name of the credential secret. Never allowed inside a session.
pub(crate) const SECRET_FIELD: &str = "password";

/// A logged-in identity.
///
/// Carries the account's `email` plus whatever extra fields the directory
/// attached to the record (e.g. its `id`), minus the credential secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique account identifier, case-sensitive as stored in the directory.
    pub email: String,
    /// Remaining account fields, secret excluded.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Session {
    /// Build a session carrying only an email.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            attributes: Map::new(),
        }
    }

    /// Whether this session smuggled in a secret field.
    ///
    /// True only for corrupted or hand-edited store payloads; such sessions
    /// are rejected at restore time.
    pub fn contains_secret(&self) -> bool {
        self.attributes.contains_key(SECRET_FIELD)
    }
}

/// Durable single-slot session persistence.
///
/// `get` must swallow malformed stored data and report it as absent — the
/// restore path never errors. `set`/`clear` faults are reported so the
/// machine can log them, but they never abort an authentication.
pub trait SessionStore: Send + Sync {
    /// Read the persisted session, if a well-formed one exists.
    fn get(&self) -> Option<Session>;
    /// Persist `session`, replacing any previous entry.
    fn set(&self, session: &Session) -> anyhow::Result<()>;
    /// Remove the persisted session. No-op when the slot is empty.
    fn clear(&self) -> anyhow::Result<()>;
}

/// In-memory store. Used by tests and by callers that want a process-local
/// session without touching disk.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: parking_lot::Mutex<Option<Session>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<Session> {
        self.slot.lock().clone().filter(|s| !s.contains_secret())
    }

    fn set(&self, session: &Session) -> anyhow::Result<()> {
        *self.slot.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_serializes_attributes_flat() {
        let mut session = Session::new("a@x.com");
        session
            .attributes
            .insert("id".into(), serde_json::json!(7));

        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains(r#""email":"a@x.com""#));
        assert!(json.contains(r#""id":7"#));

        let parsed: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, session);
    }

    #[test]
    fn session_detects_smuggled_secret() {
        let mut session = Session::new("a@x.com");
        assert!(!session.contains_secret());

        session
            .attributes
            .insert(SECRET_FIELD.into(), serde_json::json!("hunter2"));
        assert!(session.contains_secret());
    }

    #[test]
    fn memory_store_set_get_clear() {
        let store = MemorySessionStore::new();
        assert!(store.get().is_none());

        let session = Session::new("a@x.com");
        store.set(&session).unwrap();
        assert_eq!(store.get(), Some(session));

        store.clear().unwrap();
        assert!(store.get().is_none());
    }

    #[test]
    fn memory_store_rejects_secret_bearing_session() {
        let store = MemorySessionStore::new();
        let mut session = Session::new("a@x.com");
        session
            .attributes
            .insert(SECRET_FIELD.into(), serde_json::json!("hunter2"));

        store.set(&session).unwrap();
        assert!(store.get().is_none());
    }
}
