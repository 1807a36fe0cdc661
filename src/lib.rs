//! Authgate — email/password authentication core.
//!
//! Owns the authentication session lifecycle for a client application:
//! account creation and credential verification against a remote user
//! directory, session persistence across restarts, and route-guard decisions
//! for authenticated-only views.
//!
//! The contract surface is deliberately small: a presentation layer reads
//! [`AuthState`] and calls `login`, `signup`, `logout`, `clear_error` and
//! `subscribe` on the [`AuthMachine`] — it never touches the directory or
//! the session store directly.
//!
//! ```no_run
//! use std::sync::Arc;
//! use authgate::{AuthConfig, AuthMachine, HttpDirectory, SqliteSessionStore};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AuthConfig::from_env();
//! let directory = Arc::new(HttpDirectory::new(&config.directory_url, config.timeout())?);
//! let store = Arc::new(SqliteSessionStore::new(&config.session_db)?);
//!
//! let auth = AuthMachine::new(directory, store);
//! auth.restore();
//! auth.login("a@x.com", "abcdef").await?;
//! assert!(auth.is_authenticated());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod directory;
pub mod guard;
pub mod machine;
pub mod session;
pub mod state;

pub use config::AuthConfig;
pub use directory::{AccountRecord, DirectoryClient, DirectoryError, HttpDirectory, NewAccount};
pub use guard::{decide, GuardDecision};
pub use machine::{AuthError, AuthMachine, SubscriberId};
pub use session::{MemorySessionStore, Session, SessionStore, SqliteSessionStore};
pub use state::{reduce, AuthEvent, AuthState};
