//! Persisted session state for Sessionward.
//!
//! Two layers live here:
//!
//! 1. **Storage** — a string key/value backend ([`Storage`] trait) with an
//!    in-memory ([`MemoryStorage`]) and a file-backed ([`FileStorage`])
//!    implementation. Storage is fallible: disks fill up, files get
//!    corrupted, directories disappear.
//! 2. **Session store** — [`SessionStore`] reads and writes the two
//!    entries that make up [`Credentials`] and swallows storage errors
//!    after logging them. Losing persisted state only means the user has
//!    to log in again; it must never take the application down.
//!
//! # How it fits in the stack
//!
//! ```text
//! Session Layer (above)  ← saves credentials after login/renewal
//!     ↕
//! Store Layer (this crate)  ← survives restarts, shared between processes
//! ```

mod credentials;
mod error;
mod storage;

pub use credentials::{Credentials, SessionStore, EXPIRY_KEY, RENEWAL_TOKEN_KEY, now_millis};
pub use error::StoreError;
pub use storage::{FileStorage, MemoryStorage, Storage};
