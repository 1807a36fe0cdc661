//! SQLite-backed single-slot session store.
//!
//! One table, one row: `slot` is constrained to 0 so the store can never
//! hold more than one session. The payload is the JSON-serialized `Session`;
//! anything that fails to parse back is treated as absent, never as an error.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::{Session, SessionStore};

/// Durable session store at a SQLite database path.
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Open (or create) the session database at the given path.
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("opening session db {}", db_path.display()))?;

        // WAL mode for crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS session (
                slot INTEGER PRIMARY KEY CHECK (slot = 0),
                payload TEXT NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self) -> Option<Session> {
        let conn = self.conn.lock();
        let payload: String = conn
            .query_row("SELECT payload FROM session WHERE slot = 0", [], |row| {
                row.get(0)
            })
            .optional()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "session read failed; treating as absent");
                None
            })?;

        match serde_json::from_str::<Session>(&payload) {
            Ok(session) if session.contains_secret() => {
                tracing::warn!("stored session carries a secret field; discarding");
                None
            }
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "stored session is malformed; treating as absent");
                None
            }
        }
    }

    fn set(&self, session: &Session) -> Result<()> {
        let payload = serde_json::to_string(session)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO session (slot, payload) VALUES (0, ?1)
             ON CONFLICT(slot) DO UPDATE SET payload = excluded.payload",
            params![payload],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM session WHERE slot = 0", [])?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteSessionStore) {
        let tmp = TempDir::new().unwrap();
        let store = SqliteSessionStore::new(&tmp.path().join("session.db")).unwrap();
        (tmp, store)
    }

    #[test]
    fn empty_store_reads_none() {
        let (_tmp, store) = test_store();
        assert!(store.get().is_none());
    }

    #[test]
    fn set_then_get_round_trips() {
        let (_tmp, store) = test_store();

        let mut session = Session::new("a@x.com");
        session
            .attributes
            .insert("id".into(), serde_json::json!(1));

        store.set(&session).unwrap();
        assert_eq!(store.get(), Some(session));
    }

    #[test]
    fn set_replaces_previous_session() {
        let (_tmp, store) = test_store();

        store.set(&Session::new("old@x.com")).unwrap();
        store.set(&Session::new("new@x.com")).unwrap();

        assert_eq!(store.get().unwrap().email, "new@x.com");
    }

    #[test]
    fn clear_empties_the_slot() {
        let (_tmp, store) = test_store();

        store.set(&Session::new("a@x.com")).unwrap();
        store.clear().unwrap();
        assert!(store.get().is_none());

        // clearing an empty slot is fine
        store.clear().unwrap();
    }

    #[test]
    fn survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.db");

        SqliteSessionStore::new(&path)
            .unwrap()
            .set(&Session::new("a@x.com"))
            .unwrap();

        let reopened = SqliteSessionStore::new(&path).unwrap();
        assert_eq!(reopened.get().unwrap().email, "a@x.com");
    }

    #[test]
    fn garbage_payload_reads_as_absent() {
        let (_tmp, store) = test_store();

        store
            .conn
            .lock()
            .execute(
                "INSERT INTO session (slot, payload) VALUES (0, ?1)",
                params!["not json {{"],
            )
            .unwrap();

        assert!(store.get().is_none());
    }

    #[test]
    fn secret_bearing_payload_reads_as_absent() {
        let (_tmp, store) = test_store();

        store
            .conn
            .lock()
            .execute(
                "INSERT INTO session (slot, payload) VALUES (0, ?1)",
                params![r#"{"email":"a@x.com","password":"hunter2"}"#],
            )
            .unwrap();

        assert!(store.get().is_none());
    }

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("deep").join("nested").join("session.db");
        let store = SqliteSessionStore::new(&nested).unwrap();
        store.set(&Session::new("a@x.com")).unwrap();
        assert!(store.get().is_some());
    }
}
