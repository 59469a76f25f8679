//! Error types for the session layer.

use sessionward_transport::TransportError;

/// Errors returned by the session operations.
///
/// The `Display` text of the login and sign-up variants is what ends up
/// in [`AuthState::error`](crate::AuthState), so it is the backend's own
/// human-readable message where there is one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The backend refused the identifier/secret pair.
    #[error("{0}")]
    InvalidCredentials(String),

    /// The backend refused to create the account (e.g. email taken).
    #[error("{0}")]
    RegistrationConflict(String),

    /// The backend could not be reached, or answered with garbage.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The backend refused the renewal token.
    #[error("renewal rejected: {0}")]
    RenewalRejected(String),

    /// The session exists but the profile could not be loaded.
    #[error("profile unavailable: {0}")]
    ProfileUnavailable(String),

    /// A logout happened while the request was in flight, so its result
    /// was discarded.
    #[error("session was logged out while the request was in flight")]
    Superseded,
}

// A 5xx rejection is the backend failing, not the backend saying no, so
// it maps to `NetworkFailure` like an unreachable backend does.
impl SessionError {
    /// Maps a failed `authenticate` call.
    pub(crate) fn from_authenticate(err: TransportError) -> Self {
        match err {
            TransportError::Rejected { status, message } if status < 500 => {
                Self::InvalidCredentials(message)
            }
            other => Self::NetworkFailure(other.user_message()),
        }
    }

    /// Maps a failed `register` call.
    pub(crate) fn from_register(err: TransportError) -> Self {
        match err {
            TransportError::Rejected { status, message } if status < 500 => {
                Self::RegistrationConflict(message)
            }
            other => Self::NetworkFailure(other.user_message()),
        }
    }

    /// Maps a failed `renew` call.
    pub(crate) fn from_renew(err: TransportError) -> Self {
        match err {
            TransportError::Rejected { status, message } if status < 500 => {
                Self::RenewalRejected(message)
            }
            other => Self::NetworkFailure(other.user_message()),
        }
    }

    /// Maps a failed `fetch_profile` call.
    pub(crate) fn from_profile(err: TransportError) -> Self {
        Self::ProfileUnavailable(err.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_authenticate_rejection_is_invalid_credentials() {
        let err = SessionError::from_authenticate(TransportError::rejected(
            401,
            "Invalid email or password",
        ));
        assert_eq!(
            err,
            SessionError::InvalidCredentials("Invalid email or password".into())
        );
        assert_eq!(err.to_string(), "Invalid email or password");
    }

    #[test]
    fn test_from_authenticate_timeout_is_network_failure() {
        let err = SessionError::from_authenticate(TransportError::Timeout);
        assert!(matches!(err, SessionError::NetworkFailure(_)));
    }

    #[test]
    fn test_from_register_rejection_is_conflict() {
        let err = SessionError::from_register(TransportError::rejected(409, "Email taken"));
        assert_eq!(err.to_string(), "Email taken");
    }

    #[test]
    fn test_from_renew_splits_rejection_and_network() {
        assert!(matches!(
            SessionError::from_renew(TransportError::rejected(401, "expired")),
            SessionError::RenewalRejected(_)
        ));
        assert!(matches!(
            SessionError::from_renew(TransportError::Network("reset".into())),
            SessionError::NetworkFailure(_)
        ));
    }

    #[test]
    fn test_from_authenticate_server_error_is_network_failure() {
        let err = SessionError::from_authenticate(TransportError::rejected(
            503,
            "Service Unavailable",
        ));
        assert_eq!(
            err,
            SessionError::NetworkFailure("Service Unavailable".into())
        );
    }

    #[test]
    fn test_from_register_server_error_is_network_failure() {
        let err = SessionError::from_register(TransportError::rejected(500, "boom"));
        assert_eq!(err, SessionError::NetworkFailure("boom".into()));

        let err = SessionError::from_register(TransportError::rejected(499, "closed"));
        assert_eq!(err, SessionError::RegistrationConflict("closed".into()));
    }

    #[test]
    fn test_from_renew_server_error_is_network_failure() {
        assert!(matches!(
            SessionError::from_renew(TransportError::rejected(502, "Bad Gateway")),
            SessionError::NetworkFailure(_)
        ));
    }

    #[test]
    fn test_from_profile_is_always_profile_unavailable() {
        assert!(matches!(
            SessionError::from_profile(TransportError::rejected(401, "no cookie")),
            SessionError::ProfileUnavailable(_)
        ));
        assert!(matches!(
            SessionError::from_profile(TransportError::Timeout),
            SessionError::ProfileUnavailable(_)
        ));
    }
}
