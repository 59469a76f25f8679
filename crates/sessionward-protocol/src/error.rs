//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding protocol payloads.
///
/// Each crate in Sessionward owns its error enum, so a `ProtocolError`
/// always means "the bytes and the types disagree", never a network
/// or storage problem.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (Rust value → bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (bytes → Rust value).
    ///
    /// Common causes: the backend answered with HTML instead of JSON,
    /// a required field is missing, or a field has the wrong type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload decoded but violates a protocol rule, e.g. a grant
    /// with an empty renewal token.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
