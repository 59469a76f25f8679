//! Unified error type for Sessionward.

use sessionward_protocol::ProtocolError;
use sessionward_session::SessionError;
use sessionward_store::StoreError;
use sessionward_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `sessionward` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate. Each
/// variant has a `From` impl, so `?` converts sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionwardError {
    /// Building or using the backend transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A wire payload could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session operation failed (bad credentials, conflict, ...).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Direct storage access failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionwardError {
    /// The session error, if that's what this is.
    pub fn as_session(&self) -> Option<&SessionError> {
        match self {
            Self::Session(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: SessionwardError = TransportError::Network("gone".into()).into();
        assert!(matches!(err, SessionwardError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: SessionwardError = ProtocolError::InvalidPayload("bad".into()).into();
        assert!(matches!(err, SessionwardError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error_keeps_message() {
        let err: SessionwardError =
            SessionError::InvalidCredentials("Invalid email or password".into()).into();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert!(err.as_session().is_some());
    }

    #[test]
    fn test_from_store_error() {
        let err: SessionwardError = StoreError::Unavailable("disk full".into()).into();
        assert!(matches!(err, SessionwardError::Store(_)));
        assert!(err.as_session().is_none());
    }
}
