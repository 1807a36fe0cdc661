//! The authentication state machine.
//!
//! Owns the process-wide [`AuthState`], executes login/signup/logout against
//! the directory and the session store, and pushes every transition to
//! subscribers synchronously. One instance is created at startup and injected
//! into the presentation layer; nothing else ever touches the collaborators.
//!
//! ## Concurrency policy
//!
//! A second `login`/`signup` issued while one is `Pending` is rejected with
//! [`AuthError::OperationInFlight`] — a stale response can never overwrite a
//! newer one. `logout()` during `Pending` is allowed and wins: it bumps a
//! generation counter, and the in-flight resolution discards itself when it
//! sees the counter moved instead of clobbering the later `Idle`.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::directory::{DirectoryClient, DirectoryError, NewAccount};
use crate::session::{Session, SessionStore};
use crate::state::{reduce, AuthEvent, AuthState};

/// Minimum accepted password length for new accounts.
const MIN_PASSWORD_CHARS: usize = 6;

/// Operation outcomes. `Display` strings are the exact user-facing messages;
/// the `Failed` state reason is built from them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Login precondition: both credential fields must be non-empty.
    #[error("Email and password are required")]
    MissingCredentials,

    /// Signup validation: secret and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Signup validation: secret shorter than six characters.
    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,

    /// Policy (a): another login/signup is still in flight.
    #[error("another login or signup is already in progress")]
    OperationInFlight,

    /// The directory answered but no account matched the credentials.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The directory refused account creation. Carries the server-reported
    /// message, or the generic fallback when none was provided.
    #[error("{0}")]
    CreationRejected(String),

    /// The directory call itself failed. The raw cause goes to the log only.
    #[error("Login failed. Please try again.")]
    Transport,
}

impl AuthError {
    /// Locally detected, pre-network failures. These are returned to the
    /// caller as ephemeral errors and never become `Failed` state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials | Self::PasswordMismatch | Self::PasswordTooShort
        )
    }
}

/// Handle returned by [`AuthMachine::subscribe`]; pass it back to
/// [`AuthMachine::unsubscribe`] to stop receiving transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

type Listener = Arc<dyn Fn(&AuthState) + Send + Sync>;

struct Inner {
    state: AuthState,
    /// Bumped by `logout`; resolutions carrying an older value are discarded.
    generation: u64,
    /// `restore` runs at most once per machine.
    restored: bool,
}

/// The authentication session state machine.
pub struct AuthMachine {
    directory: Arc<dyn DirectoryClient>,
    store: Arc<dyn SessionStore>,
    inner: Mutex<Inner>,
    listeners: Mutex<Vec<(SubscriberId, Listener)>>,
    next_listener_id: AtomicU64,
}

impl AuthMachine {
    /// Create a machine over the given collaborators, starting `Idle`.
    pub fn new(directory: Arc<dyn DirectoryClient>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            directory,
            store,
            inner: Mutex::new(Inner {
                state: AuthState::Idle,
                generation: 0,
                restored: false,
            }),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.inner.lock().state.clone()
    }

    /// True iff the current state is `Authenticated`.
    pub fn is_authenticated(&self) -> bool {
        self.inner.lock().state.is_authenticated()
    }

    /// Restore a persisted session at process start.
    ///
    /// Reads the session store only — never the directory. Runs at most once
    /// per machine and only out of `Idle`; every later call is a no-op. A
    /// missing or malformed store entry leaves the state `Idle`.
    pub fn restore(&self) {
        let snapshot = {
            let mut inner = self.inner.lock();
            if inner.restored {
                return;
            }
            inner.restored = true;
            if !matches!(inner.state, AuthState::Idle) {
                return;
            }
            match self.store.get() {
                Some(session) => {
                    tracing::info!(email = %session.email, "session restored");
                    inner.state = reduce(
                        std::mem::take(&mut inner.state),
                        AuthEvent::Succeeded(session),
                    );
                    inner.state.clone()
                }
                None => return,
            }
        };
        self.notify(&snapshot);
    }

    /// Verify a credential pair against the directory.
    ///
    /// Transitions to `Pending` immediately (clearing any prior failure),
    /// then resolves to `Authenticated` or `Failed` as the directory answers.
    /// The returned error mirrors the failure recorded in the state, except
    /// for [`AuthError::MissingCredentials`] and
    /// [`AuthError::OperationInFlight`], which leave the state untouched.
    pub async fn login(&self, email: &str, secret: &str) -> Result<(), AuthError> {
        if email.is_empty() || secret.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let generation = self.begin_operation()?;
        self.authenticate(email, secret, generation).await
    }

    /// Create an account, then log straight into it.
    ///
    /// Validation runs before any network call and short-circuits in order:
    /// mismatch, then length. Validation failures are returned without any
    /// state transition. On successful creation the machine chains into the
    /// login path with the just-created credentials, so the happy path never
    /// ends created-but-logged-out.
    pub async fn signup(
        &self,
        email: &str,
        secret: &str,
        confirm_secret: &str,
    ) -> Result<(), AuthError> {
        if secret != confirm_secret {
            return Err(AuthError::PasswordMismatch);
        }
        if secret.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::PasswordTooShort);
        }
        if email.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let generation = self.begin_operation()?;
        let account = NewAccount {
            email,
            password: secret,
        };
        match self.directory.create_account(&account).await {
            Ok(_) => self.authenticate(email, secret, generation).await,
            Err(DirectoryError::Rejected { message }) => {
                let reason =
                    message.unwrap_or_else(|| "Failed to create account".to_string());
                self.complete(generation, Err(AuthError::CreationRejected(reason)))
            }
            Err(DirectoryError::Transport(cause)) => {
                tracing::warn!(error = %cause, "account creation transport failure");
                self.complete(
                    generation,
                    Err(AuthError::CreationRejected(
                        "Failed to create account".to_string(),
                    )),
                )
            }
        }
    }

    /// Log out. Unconditional: clears the store, forces `Idle`, and
    /// invalidates any in-flight operation. Never fails.
    pub fn logout(&self) {
        let snapshot = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            if let Err(e) = self.store.clear() {
                tracing::warn!(error = %e, "failed to clear persisted session");
            }
            inner.state = reduce(std::mem::take(&mut inner.state), AuthEvent::LoggedOut);
            inner.state.clone()
        };
        self.notify(&snapshot);
    }

    /// Drop a stale failure: `Failed → Idle`, no-op in any other state.
    pub fn clear_error(&self) {
        let snapshot = {
            let mut inner = self.inner.lock();
            if !matches!(inner.state, AuthState::Failed { .. }) {
                return;
            }
            inner.state = reduce(std::mem::take(&mut inner.state), AuthEvent::ErrorCleared);
            inner.state.clone()
        };
        self.notify(&snapshot);
    }

    /// Register a listener invoked synchronously after every transition.
    pub fn subscribe<F>(&self, listener: F) -> SubscriberId
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Unknown handles are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.listeners.lock().retain(|(lid, _)| *lid != id);
    }

    // ── Internals ────────────────────────────────────────────────

    /// Enter `Pending`, rejecting if another operation is already there.
    /// Returns the generation the operation must present at completion.
    fn begin_operation(&self) -> Result<u64, AuthError> {
        let (generation, snapshot) = {
            let mut inner = self.inner.lock();
            if matches!(inner.state, AuthState::Pending) {
                return Err(AuthError::OperationInFlight);
            }
            inner.state = reduce(std::mem::take(&mut inner.state), AuthEvent::Started);
            (inner.generation, inner.state.clone())
        };
        self.notify(&snapshot);
        Ok(generation)
    }

    /// Query the directory and resolve the in-flight operation.
    async fn authenticate(
        &self,
        email: &str,
        secret: &str,
        generation: u64,
    ) -> Result<(), AuthError> {
        match self.directory.list_accounts().await {
            Ok(accounts) => {
                // First match in directory order; duplicates should not exist
                // but the directory is not trusted to enforce that.
                let matched = accounts
                    .into_iter()
                    .find(|a| a.email == email && a.password == secret);
                match matched {
                    Some(account) => self.complete(generation, Ok(account.into_session())),
                    None => self.complete(generation, Err(AuthError::InvalidCredentials)),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "directory listing failed");
                self.complete(generation, Err(AuthError::Transport))
            }
        }
    }

    /// Apply an operation's outcome, unless a logout superseded it.
    ///
    /// On success the session is persisted and the state becomes
    /// `Authenticated` in the same logical step; on failure the state becomes
    /// `Failed` with the error's message. A stale generation applies nothing
    /// — in particular it must not re-write a store a logout just cleared.
    fn complete(
        &self,
        generation: u64,
        outcome: Result<Session, AuthError>,
    ) -> Result<(), AuthError> {
        let snapshot = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                tracing::info!("discarding superseded auth resolution");
                return outcome.map(|_| ());
            }
            match &outcome {
                Ok(session) => {
                    if let Err(e) = self.store.set(session) {
                        tracing::warn!(error = %e, "failed to persist session");
                    }
                    inner.state = reduce(
                        std::mem::take(&mut inner.state),
                        AuthEvent::Succeeded(session.clone()),
                    );
                }
                Err(err) => {
                    inner.state = reduce(
                        std::mem::take(&mut inner.state),
                        AuthEvent::Failed(err.to_string()),
                    );
                }
            }
            inner.state.clone()
        };
        self.notify(&snapshot);
        outcome.map(|_| ())
    }

    /// Invoke every listener with the new state. Called after the state lock
    /// is released so listeners may call back into the machine.
    fn notify(&self, state: &AuthState) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(state);
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
