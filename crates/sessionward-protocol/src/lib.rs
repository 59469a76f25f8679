//! Wire protocol for Sessionward.
//!
//! This crate defines what the client and the identity backend exchange:
//!
//! - **Types** ([`RenewalGrant`], [`UserProfile`], request bodies) —
//!   the structures that travel over HTTP.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those structures
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding
//!   or decoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (HTTP bytes) → Protocol (typed payloads) → Session (state machine)
//! ```
//!
//! The protocol layer knows nothing about timers, storage or sessions.

mod codec;
mod error;
mod types;

pub use codec::Codec;
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ErrorBody, LoginRequest, RegisterRequest, RenewRequest, RenewalGrant,
    UserProfile,
};
