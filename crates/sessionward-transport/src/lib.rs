//! Transport layer for Sessionward: the boundary to the identity backend.
//!
//! Sessionward doesn't verify credentials or mint tokens itself, a
//! remote identity backend does. This crate defines the
//! [`SessionTransport`] trait, five fallible async calls the session
//! state machine makes, and ships an HTTP implementation.
//!
//! # Why a trait?
//!
//! The state machine only needs to know WHAT the backend can do, not
//! HOW. That lets us:
//! - Talk HTTP + cookies in production ([`HttpTransport`])
//! - Use a scripted stub that counts calls in tests
//! - Swap in another backend protocol without touching the state machine
//!
//! # Feature Flags
//!
//! - `http` (default) — HTTP transport via `reqwest`

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::{HttpTransport, HttpTransportConfig};

use std::future::Future;
use std::sync::Arc;

use sessionward_protocol::{RenewalGrant, UserProfile};

/// The calls the session state machine makes to the identity backend.
///
/// # Trait bounds
///
/// - `Send + Sync` → the transport is shared between the caller's task
///   and the background renewal task.
/// - `'static` → it lives as long as the session manager.
///
/// Each method returns a `Send` future so the scheduled renewal can run
/// on any Tokio worker thread. Implementations just write `async fn`.
///
/// # Example
///
/// ```rust
/// use sessionward_protocol::{RenewalGrant, UserProfile};
/// use sessionward_transport::{SessionTransport, TransportError};
///
/// /// Accepts one hard-coded account. Development only.
/// struct DevBackend;
///
/// impl SessionTransport for DevBackend {
///     async fn authenticate(
///         &self,
///         identifier: &str,
///         secret: &str,
///     ) -> Result<RenewalGrant, TransportError> {
///         if identifier == "dev@example.com" && secret == "dev" {
///             Ok(RenewalGrant::new("dev-token", 3600))
///         } else {
///             Err(TransportError::rejected(401, "Invalid email or password"))
///         }
///     }
///
///     async fn renew(&self, token: &str) -> Result<RenewalGrant, TransportError> {
///         Ok(RenewalGrant::new(token, 3600))
///     }
///
///     async fn fetch_profile(&self) -> Result<UserProfile, TransportError> {
///         Ok(UserProfile::new(1, "Dev"))
///     }
///
///     async fn terminate(&self) -> Result<(), TransportError> {
///         Ok(())
///     }
///
///     async fn register(
///         &self,
///         _name: &str,
///         _identifier: &str,
///         _secret: &str,
///     ) -> Result<(), TransportError> {
///         Err(TransportError::rejected(409, "Registration is closed"))
///     }
/// }
/// ```
pub trait SessionTransport: Send + Sync + 'static {
    /// Exchanges an identifier and secret for a renewal grant.
    ///
    /// On success the backend has also set the short-lived credential
    /// out-of-band (cookie).
    fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> impl Future<Output = Result<RenewalGrant, TransportError>> + Send;

    /// Exchanges a renewal token for a fresh grant. The returned token
    /// may be the same one or a rotated replacement.
    fn renew(
        &self,
        renewal_token: &str,
    ) -> impl Future<Output = Result<RenewalGrant, TransportError>> + Send;

    /// Fetches the profile of whoever the current short-lived
    /// credential belongs to.
    fn fetch_profile(
        &self,
    ) -> impl Future<Output = Result<UserProfile, TransportError>> + Send;

    /// Tells the backend the session is over. Callers ignore the result.
    fn terminate(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Creates an account. Does not establish a session by itself.
    fn register(
        &self,
        name: &str,
        identifier: &str,
        secret: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Sharing a transport behind an `Arc` keeps it usable as a transport,
/// so callers can hold on to a handle (e.g. to read a stub's counters).
impl<T: SessionTransport> SessionTransport for Arc<T> {
    fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> impl Future<Output = Result<RenewalGrant, TransportError>> + Send {
        (**self).authenticate(identifier, secret)
    }

    fn renew(
        &self,
        renewal_token: &str,
    ) -> impl Future<Output = Result<RenewalGrant, TransportError>> + Send {
        (**self).renew(renewal_token)
    }

    fn fetch_profile(
        &self,
    ) -> impl Future<Output = Result<UserProfile, TransportError>> + Send {
        (**self).fetch_profile()
    }

    fn terminate(&self) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).terminate()
    }

    fn register(
        &self,
        name: &str,
        identifier: &str,
        secret: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).register(name, identifier, secret)
    }
}
