//! REST implementation of the user directory.
//!
//! Talks to a json-server style store: `GET {base}/users` lists accounts,
//! `POST {base}/users` creates one. A rejection body is `{"error": "..."}`
//! and that message is surfaced verbatim as the conflict reason.

use serde::Deserialize;
use std::time::Duration;

use super::{AccountRecord, DirectoryClient, DirectoryError, NewAccount};

/// Error body shape the directory uses for rejected writes.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the user directory.
pub struct HttpDirectory {
    base_url: String,
    http: reqwest::Client,
}

impl HttpDirectory {
    /// Create a client for the directory at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Build the accounts collection URL.
    fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }
}

#[async_trait::async_trait]
impl DirectoryClient for HttpDirectory {
    async fn list_accounts(&self) -> Result<Vec<AccountRecord>, DirectoryError> {
        let resp = self
            .http
            .get(self.users_url())
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.into()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(DirectoryError::Transport(anyhow::anyhow!(
                "directory listing returned status {status}"
            )));
        }

        resp.json::<Vec<AccountRecord>>()
            .await
            .map_err(|e| DirectoryError::Transport(e.into()))
    }

    async fn create_account(
        &self,
        account: &NewAccount<'_>,
    ) -> Result<AccountRecord, DirectoryError> {
        let resp = self
            .http
            .post(self.users_url())
            .json(account)
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.into()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let message = resp
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error);
            tracing::warn!(%status, ?message, "directory rejected account creation");
            return Err(DirectoryError::Rejected { message });
        }

        resp.json::<AccountRecord>()
            .await
            .map_err(|e| DirectoryError::Transport(e.into()))
    }
}

// ── Tests ────────────────────────────────────────────────────────
