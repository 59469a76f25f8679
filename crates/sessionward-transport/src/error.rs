use sessionward_protocol::ProtocolError;

/// Errors that can occur while talking to the identity backend.
///
/// Every variant owns plain data, so the error is `Clone`: stub
/// transports in tests hand out the same scripted failure repeatedly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The backend answered, but said no (any non-2xx status).
    ///
    /// `message` is the human-readable reason from the response body,
    /// or the status reason phrase when the body had none.
    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The request never got a response: DNS, connect, TLS, reset.
    #[error("network failure: {0}")]
    Network(String),

    /// The request was sent but no response arrived in time.
    #[error("request timed out")]
    Timeout,

    /// A 2xx response whose body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// Shorthand for a rejection, mostly used by stubs.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// `true` when the backend itself refused the request, as opposed to
    /// the request never reaching it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// The message to show a person, without the status prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<ProtocolError> for TransportError {
    fn from(err: ProtocolError) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
