//! Runtime configuration.
//!
//! Defaults target the local demo directory; environment variables override
//! defaults and CLI flags override both (merging happens in `main`).

use std::path::PathBuf;
use std::time::Duration;

/// Default user directory endpoint.
const DEFAULT_DIRECTORY_URL: &str = "http://localhost:3001";

/// Default directory request timeout (seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Auth client configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base URL of the user directory.
    pub directory_url: String,
    /// Per-request timeout for directory calls.
    pub timeout_secs: u64,
    /// Path of the persisted session database.
    pub session_db: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_db: default_session_db(),
        }
    }
}

impl AuthConfig {
    /// Defaults overridden by `AUTHGATE_DIRECTORY_URL`,
    /// `AUTHGATE_TIMEOUT_SECS` and `AUTHGATE_SESSION_DB` where set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("AUTHGATE_DIRECTORY_URL") {
            if !url.is_empty() {
                config.directory_url = url;
            }
        }
        if let Ok(secs) = std::env::var("AUTHGATE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.timeout_secs = secs;
            }
        }
        if let Ok(path) = std::env::var("AUTHGATE_SESSION_DB") {
            if !path.is_empty() {
                config.session_db = PathBuf::from(path);
            }
        }
        config
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Platform data directory, falling back to the working directory when the
/// platform reports none.
fn default_session_db() -> PathBuf {
    directories::ProjectDirs::from("", "", "authgate")
        .map(|dirs| dirs.data_dir().join("session.db"))
        .unwrap_or_else(|| PathBuf::from("authgate-session.db"))
}

// ── Tests ────────────────────────────────────────────────────────
