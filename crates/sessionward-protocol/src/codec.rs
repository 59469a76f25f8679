//! Codec trait and implementations for request/response bodies.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The HTTP transport doesn't care how bodies are serialized, it just
//! needs something that implements [`Codec`]. Today that is
//! [`JsonCodec`]; a backend speaking another format only needs a new
//! implementation, not a new transport.

use serde::{Serialize, de::DeserializeOwned};

use crate::{ErrorBody, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// - `Send + Sync` → the transport (and therefore the codec) is shared
///   between the caller's task and the background renewal task.
/// - `'static` → the codec owns everything it needs.
pub trait Codec: Send + Sync + 'static {
    /// The `Content-Type` header value for bodies this codec produces.
    fn content_type(&self) -> &'static str;

    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Extracts a human-readable message from an error response body.
    ///
    /// Returns `None` when the body is empty or not understood; callers
    /// fall back to the HTTP status text.
    fn error_message(&self, data: &[u8]) -> Option<String> {
        self.decode::<ErrorBody>(data).ok()?.into_message()
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use sessionward_protocol::{Codec, JsonCodec, RenewalGrant};
///
/// let codec = JsonCodec;
/// let grant: RenewalGrant = codec
///     .decode(br#"{"refreshToken":"r1","expiresIn":3600}"#)
///     .unwrap();
/// assert_eq!(grant.expires_in_seconds, 3600);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
