//! # Sessionward
//!
//! Client-side session lifecycle manager.
//!
//! Sessionward signs a user in against a remote identity backend, keeps
//! the long-lived renewal token on disk so the session survives restarts,
//! renews the short-lived credential shortly before it expires, and
//! wipes everything on logout or when a renewal is refused.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sessionward::prelude::*;
//!
//! # async fn run() -> Result<(), SessionwardError> {
//! let client = SessionClient::builder()
//!     .base_url("https://id.example.com/api")
//!     .storage_path("/var/lib/myapp/session.json")
//!     .build()?;
//!
//! client.initialize().await;
//! if !client.is_authenticated() {
//!     client.login("a@b.com", "pw").await?;
//! }
//! println!("{:?}", client.state().user);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Crate | Role |
//! |---|---|
//! | `sessionward-protocol` | wire types and body codec |
//! | `sessionward-transport` | identity backend calls, HTTP implementation |
//! | `sessionward-store` | persisted credentials, storage backends |
//! | `sessionward-refresh` | single-timer renewal scheduler |
//! | `sessionward-session` | the session state machine |

mod client;
mod config;
mod error;
pub mod logging;

pub use client::{SessionClient, SessionClientBuilder};
pub use config::{ClientConfig, ENV_BASE_URL, ENV_STORAGE_PATH, ENV_TIMEOUT_SECS};
pub use error::SessionwardError;

pub use sessionward_protocol as protocol;
pub use sessionward_refresh as refresh;
pub use sessionward_session as session;
pub use sessionward_store as store;
pub use sessionward_transport as transport;

pub mod prelude {
    pub use crate::{ClientConfig, SessionClient, SessionClientBuilder, SessionwardError};
    pub use sessionward_protocol::UserProfile;
    pub use sessionward_refresh::RefreshPolicy;
    pub use sessionward_session::{
        AuthState, RefreshOutcome, SessionConfig, SessionError, SessionPhase,
    };
    pub use sessionward_store::{FileStorage, MemoryStorage, Storage};
    pub use sessionward_transport::{
        HttpTransport, HttpTransportConfig, SessionTransport, TransportError,
    };
}
