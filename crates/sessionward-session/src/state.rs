//! Observable session state and configuration.

use sessionward_protocol::UserProfile;
use sessionward_refresh::RefreshPolicy;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session manager.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// When to renew the short-lived credential.
    pub refresh: RefreshPolicy,
}

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

/// What consumers see of the session.
///
/// `loading` is `true` only while `initialize`, `login` or `sign_up` is
/// in flight. `error` is cleared at the start of every new attempt and
/// only ever holds a login or sign-up failure; background renewals and
/// startup recovery never set it.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    /// The signed-in user, as returned by the backend.
    pub user: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    /// The state before `initialize` has finished: loading, nobody signed in.
    pub fn initial() -> Self {
        Self {
            user: None,
            loading: true,
            error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::initial()
    }
}

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Where the manager is in its lifecycle.
///
/// ```text
///   Uninitialized ──(initialize)──→ Initializing ──┬──→ Authenticated
///                                                  └──→ Unauthenticated
///
///   Authenticated ⇄ Unauthenticated   (login / logout / failed renewal)
/// ```
///
/// `Initializing` is entered at most once per manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Initializing,
    Authenticated,
    Unauthenticated,
}

// ---------------------------------------------------------------------------
// RefreshOutcome
// ---------------------------------------------------------------------------

/// What a call to `refresh` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New credentials were persisted and the timer re-armed.
    Renewed,
    /// There was no session to renew (or it vanished mid-flight); nothing changed.
    NoSession,
    /// The backend refused or could not be reached; the session was wiped.
    Expired,
}
