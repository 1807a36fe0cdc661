//! Route guard: a pure policy over `(AuthState, requested path)`.
//!
//! Protected views require `Authenticated`, otherwise the guard redirects to
//! the login view. The login/signup views themselves redirect to the default
//! protected view once authenticated. Unknown paths are not special-cased:
//! they redirect to the default protected view and the caller runs the guard
//! again from there, which bounces unauthenticated visitors on to login.

use crate::state::AuthState;

/// The login view.
pub const LOGIN_PATH: &str = "/login";
/// The signup view.
pub const SIGNUP_PATH: &str = "/signup";
/// The default protected view.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// The requested view may render.
    Allow,
    /// The caller must navigate to this path instead.
    RedirectTo(&'static str),
}

/// Decide whether `path` may render under the given auth state.
pub fn decide(state: &AuthState, path: &str) -> GuardDecision {
    let authenticated = state.is_authenticated();
    match path {
        LOGIN_PATH | SIGNUP_PATH => {
            if authenticated {
                GuardDecision::RedirectTo(DASHBOARD_PATH)
            } else {
                GuardDecision::Allow
            }
        }
        DASHBOARD_PATH => {
            if authenticated {
                GuardDecision::Allow
            } else {
                GuardDecision::RedirectTo(LOGIN_PATH)
            }
        }
        // catch-all: delegate to the dashboard's own guard
        _ => GuardDecision::RedirectTo(DASHBOARD_PATH),
    }
}

/// Follow redirects until a view is allowed. Terminates because the guard's
/// redirect graph has no cycle: unknown → dashboard → login, and login always
/// allows when unauthenticated while dashboard always allows when
/// authenticated.
pub fn resolve(state: &AuthState, path: &str) -> &'static str {
    let mut current: &str = path;
    loop {
        match decide(state, current) {
            GuardDecision::Allow => {
                // known paths only; anything else was redirected above
                return match current {
                    LOGIN_PATH => LOGIN_PATH,
                    SIGNUP_PATH => SIGNUP_PATH,
                    _ => DASHBOARD_PATH,
                };
            }
            GuardDecision::RedirectTo(next) => current = next,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;

    fn authed() -> AuthState {
        AuthState::Authenticated {
            session: Session::new("a@x.com"),
        }
    }

    #[test]
    fn dashboard_requires_authentication() {
        assert_eq!(
            decide(&AuthState::Idle, DASHBOARD_PATH),
            GuardDecision::RedirectTo(LOGIN_PATH)
        );
        assert_eq!(decide(&authed(), DASHBOARD_PATH), GuardDecision::Allow);
    }

    #[test]
    fn auth_views_redirect_once_authenticated() {
        assert_eq!(decide(&AuthState::Idle, LOGIN_PATH), GuardDecision::Allow);
        assert_eq!(decide(&AuthState::Idle, SIGNUP_PATH), GuardDecision::Allow);
        assert_eq!(
            decide(&authed(), LOGIN_PATH),
            GuardDecision::RedirectTo(DASHBOARD_PATH)
        );
        assert_eq!(
            decide(&authed(), SIGNUP_PATH),
            GuardDecision::RedirectTo(DASHBOARD_PATH)
        );
    }

    #[test]
    fn unknown_path_delegates_to_dashboard() {
        assert_eq!(
            decide(&AuthState::Idle, "/no-such-page"),
            GuardDecision::RedirectTo(DASHBOARD_PATH)
        );
        assert_eq!(
            decide(&authed(), "/no-such-page"),
            GuardDecision::RedirectTo(DASHBOARD_PATH)
        );
    }

    #[test]
    fn unknown_path_chain_lands_on_login_when_unauthenticated() {
        assert_eq!(resolve(&AuthState::Idle, "/no-such-page"), LOGIN_PATH);
        assert_eq!(resolve(&authed(), "/no-such-page"), DASHBOARD_PATH);
    }

    #[test]
    fn pending_and_failed_are_not_authenticated() {
        for state in [
            AuthState::Pending,
            AuthState::Failed { reason: "x".into() },
        ] {
            assert_eq!(
                decide(&state, DASHBOARD_PATH),
                GuardDecision::RedirectTo(LOGIN_PATH)
            );
            assert_eq!(decide(&state, LOGIN_PATH), GuardDecision::Allow);
        }
    }
}
