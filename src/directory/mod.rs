//! User directory collaborator: the remote store of account records.
//!
//! The auth machine only ever does two things with the directory — list the
//! accounts to verify a credential pair, and create a new account. Exact
//! transport lives behind the `DirectoryClient` trait; the REST
//! implementation is in [`http`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::session::Session;

pub mod http;

pub use http::HttpDirectory;

/// Failure modes of a directory call.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The call itself failed: unreachable host, timeout, or a response that
    /// could not be decoded. The cause is kept for logs, never for users.
    #[error("directory unreachable: {0}")]
    Transport(#[source] anyhow::Error),

    /// The directory answered and refused the operation (e.g. duplicate
    /// email on creation). `message` is the server-reported reason, if any.
    #[error("{}", message.as_deref().unwrap_or("account creation rejected"))]
    Rejected { message: Option<String> },
}

/// An account record as the directory stores it.
///
/// `password` is the credential secret; it exists client-side only for the
/// duration of the verify/create call and is stripped before a `Session` is
/// built. Extra fields (e.g. the store's `id`) ride along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccountRecord {
    /// Convert into a session, dropping the secret.
    pub fn into_session(self) -> Session {
        Session {
            email: self.email,
            attributes: self.extra,
        }
    }
}

/// Payload for account creation. Exactly the two credential fields; the
/// directory assigns everything else.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Remote user directory operations.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Fetch every account record, in directory order.
    async fn list_accounts(&self) -> Result<Vec<AccountRecord>, DirectoryError>;

    /// Create a new account. Returns the record as the directory stored it.
    async fn create_account(
        &self,
        account: &NewAccount<'_>,
    ) -> Result<AccountRecord, DirectoryError>;
}

// ── Tests ────────────────────────────────────────────────────────
