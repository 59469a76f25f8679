//! Payload types exchanged with the identity backend.
//!
//! Every type here is serialized as JSON with `camelCase` field names,
//! which is what the backend speaks. The Rust side keeps `snake_case`
//! names; `#[serde(rename_all = "camelCase")]` bridges the two.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// The account identifier (usually an email address).
    pub email: String,
    /// The account secret, sent as-is over TLS.
    pub password: String,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Display name for the new account.
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewRequest {
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// What the backend returns after a successful login or renewal.
///
/// The short-lived credential itself never appears here: the backend
/// sets it as an HTTP-only cookie. The client only learns how long that
/// cookie stays valid (`expires_in_seconds`) and receives the long-lived
/// renewal token, which may be rotated on every renewal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalGrant {
    /// Opaque long-lived token used to obtain the next grant.
    #[serde(rename = "refreshToken", alias = "renewalToken")]
    pub renewal_token: String,

    /// Lifetime of the short-lived credential, in seconds from now.
    #[serde(rename = "expiresIn", alias = "expiresInSeconds")]
    pub expires_in_seconds: u64,
}

impl RenewalGrant {
    /// Creates a grant. Mostly useful for stubs and tests.
    pub fn new(renewal_token: impl Into<String>, expires_in_seconds: u64) -> Self {
        Self {
            renewal_token: renewal_token.into(),
            expires_in_seconds,
        }
    }

    /// Rejects grants that decoded fine but cannot be used.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidPayload`] if the renewal token is blank.
    pub fn validate(self) -> Result<Self, ProtocolError> {
        if self.renewal_token.trim().is_empty() {
            return Err(ProtocolError::InvalidPayload(
                "grant carries an empty renewal token".into(),
            ));
        }
        Ok(self)
    }
}

/// The authenticated user, as reported by `GET /auth/me`.
///
/// The session layer never interprets these fields; it only needs a
/// profile to exist before it considers a user signed in. Fields the
/// backend adds later land in `extra` instead of being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Set when the backend forces a password change on next use.
    #[serde(default)]
    pub must_change_password: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Creates a profile with just an id and a name.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: None,
            role: None,
            must_change_password: false,
            extra: serde_json::Map::new(),
        }
    }
}

/// Error body the backend sends with non-2xx responses.
///
/// Backends disagree on the field name, so both `message` and `error`
/// are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// The human-readable message, if the body carried one.
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}
