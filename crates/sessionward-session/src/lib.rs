//! Session lifecycle management for Sessionward.
//!
//! This crate ties the lower layers together into one state machine:
//!
//! 1. **Acquire** — `login` / `sign_up` exchange credentials for a
//!    renewal grant through a [`SessionTransport`](sessionward_transport::SessionTransport)
//! 2. **Persist** — the grant is mirrored into a
//!    [`SessionStore`](sessionward_store::SessionStore) so it survives restarts
//! 3. **Renew** — a single [`RefreshScheduler`](sessionward_refresh::RefreshScheduler)
//!    timer renews shortly before expiry
//! 4. **Invalidate** — `logout`, or any failed renewal, wipes it all
//!
//! # How it fits in the stack
//!
//! ```text
//! Facade (above)  ← SessionClient, builder, config
//!     ↕
//! Session Layer (this crate)  ← AuthState, phases, renewal orchestration
//!     ↕
//! Transport / Store / Refresh (below)
//! ```

mod error;
mod manager;
mod state;

pub use error::SessionError;
pub use manager::SessionManager;
pub use state::{AuthState, RefreshOutcome, SessionConfig, SessionPhase};
