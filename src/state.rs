//! Authentication state as a tagged union plus its pure transition function.
//!
//! Exactly one variant is active at any time; `Authenticated` and `Failed`
//! are mutually exclusive by construction. All mutation goes through
//! [`reduce`], so the transition table is testable without any I/O.

use crate::session::Session;

/// The machine's exposed state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    /// Not authenticated, nothing in flight, no error.
    #[default]
    Idle,
    /// A login or signup is in flight; any prior error is cleared.
    Pending,
    /// Logged in.
    Authenticated { session: Session },
    /// The last operation failed with `reason`. Not authenticated.
    Failed { reason: String },
}

impl AuthState {
    /// True iff the state is `Authenticated`.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// The current session, when authenticated.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated { session } => Some(session),
            _ => None,
        }
    }

    /// The failure reason, when in the `Failed` state.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Events that drive state transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// A login or signup started.
    Started,
    /// The in-flight operation produced a session.
    Succeeded(Session),
    /// The in-flight operation failed with a user-facing reason.
    Failed(String),
    /// The user logged out.
    LoggedOut,
    /// The surrounding UI asked for a stale error to be dropped.
    ErrorCleared,
}

/// The transition function: `(state, event) -> state`.
///
/// `ErrorCleared` only moves `Failed` back to `Idle` and leaves every other
/// state untouched. The remaining events apply unconditionally — ordering
/// discipline (who may emit what, and when) lives in the machine, not here.
pub fn reduce(state: AuthState, event: AuthEvent) -> AuthState {
    match event {
        AuthEvent::Started => AuthState::Pending,
        AuthEvent::Succeeded(session) => AuthState::Authenticated { session },
        AuthEvent::Failed(reason) => AuthState::Failed { reason },
        AuthEvent::LoggedOut => AuthState::Idle,
        AuthEvent::ErrorCleared => match state {
            AuthState::Failed { .. } => AuthState::Idle,
            other => other,
        },
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("a@x.com")
    }

    #[test]
    fn started_clears_previous_failure() {
        let failed = AuthState::Failed {
            reason: "Invalid email or password".into(),
        };
        assert_eq!(reduce(failed, AuthEvent::Started), AuthState::Pending);
    }

    #[test]
    fn succeeded_authenticates() {
        let next = reduce(AuthState::Pending, AuthEvent::Succeeded(session()));
        assert!(next.is_authenticated());
        assert_eq!(next.session().unwrap().email, "a@x.com");
    }

    #[test]
    fn failed_records_reason() {
        let next = reduce(
            AuthState::Pending,
            AuthEvent::Failed("Invalid email or password".into()),
        );
        assert_eq!(next.error(), Some("Invalid email or password"));
        assert!(!next.is_authenticated());
    }

    #[test]
    fn logged_out_resets_from_any_state() {
        for state in [
            AuthState::Idle,
            AuthState::Pending,
            AuthState::Authenticated { session: session() },
            AuthState::Failed { reason: "x".into() },
        ] {
            assert_eq!(reduce(state, AuthEvent::LoggedOut), AuthState::Idle);
        }
    }

    #[test]
    fn error_cleared_only_affects_failed() {
        let failed = AuthState::Failed { reason: "x".into() };
        assert_eq!(reduce(failed, AuthEvent::ErrorCleared), AuthState::Idle);

        let authed = AuthState::Authenticated { session: session() };
        assert_eq!(reduce(authed.clone(), AuthEvent::ErrorCleared), authed);

        assert_eq!(
            reduce(AuthState::Idle, AuthEvent::ErrorCleared),
            AuthState::Idle
        );
        assert_eq!(
            reduce(AuthState::Pending, AuthEvent::ErrorCleared),
            AuthState::Pending
        );
    }

    #[test]
    fn authenticated_and_failed_are_exclusive() {
        let next = reduce(
            AuthState::Authenticated { session: session() },
            AuthEvent::Failed("x".into()),
        );
        assert!(!next.is_authenticated());
        assert!(next.error().is_some());
        assert!(next.session().is_none());
    }
}
