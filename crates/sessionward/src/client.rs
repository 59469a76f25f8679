//! `SessionClient` handle and builder.
//!
//! This is the entry point for applications. It wires the layers
//! together: transport + store + scheduler → session manager.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sessionward_protocol::UserProfile;
use sessionward_refresh::RefreshPolicy;
use sessionward_session::{AuthState, RefreshOutcome, SessionConfig, SessionManager, SessionPhase};
use sessionward_store::{FileStorage, MemoryStorage, Storage};
use sessionward_transport::{HttpTransport, SessionTransport};
use tokio::sync::watch;

use crate::{ClientConfig, SessionwardError};

/// Builder for a [`SessionClient`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use sessionward::SessionClient;
///
/// # fn run() -> Result<(), sessionward::SessionwardError> {
/// let client = SessionClient::builder()
///     .base_url("https://id.example.com/api")
///     .request_timeout(Duration::from_secs(10))
///     .storage_path("session.json")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionClientBuilder {
    config: ClientConfig,
}

impl SessionClientBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing config, e.g. [`ClientConfig::from_env`].
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Sets the identity backend's base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Persists the session in a JSON file at `path`.
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_path = Some(path.into());
        self
    }

    /// Keeps the session in memory only.
    pub fn memory_storage(mut self) -> Self {
        self.config.storage_path = None;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Sets the renewal policy.
    pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.config.session.refresh = policy;
        self
    }

    /// The config built so far.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builds an HTTP client with file or memory storage.
    ///
    /// # Errors
    /// [`SessionwardError::Transport`] if the HTTP client can't be built.
    pub fn build(self) -> Result<SessionClient<HttpTransport, Box<dyn Storage>>, SessionwardError> {
        let transport = HttpTransport::new(self.config.transport_config())?;
        let storage: Box<dyn Storage> = match &self.config.storage_path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using file storage");
                Box::new(FileStorage::new(path))
            }
            None => {
                tracing::debug!("using memory storage");
                Box::new(MemoryStorage::new())
            }
        };
        Ok(SessionClient::new(transport, storage, self.config.session))
    }

    /// Builds a client around a custom transport and storage. The URL,
    /// timeout and storage path settings are ignored.
    pub fn build_with<T: SessionTransport, S: Storage>(
        self,
        transport: T,
        storage: S,
    ) -> SessionClient<T, S> {
        SessionClient::new(transport, storage, self.config.session)
    }
}

/// Handle to a session. Cheap to clone; all clones share one session.
///
/// Must be used inside a Tokio runtime once a session exists, since the
/// renewal timer is a spawned task.
pub struct SessionClient<T: SessionTransport, S: Storage> {
    manager: Arc<SessionManager<T, S>>,
}

impl<T: SessionTransport, S: Storage> Clone for SessionClient<T, S> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
        }
    }
}

impl SessionClient<HttpTransport, Box<dyn Storage>> {
    /// Creates a new builder.
    pub fn builder() -> SessionClientBuilder {
        SessionClientBuilder::new()
    }
}

impl<T: SessionTransport, S: Storage> SessionClient<T, S> {
    pub fn new(transport: T, storage: S, config: SessionConfig) -> Self {
        Self {
            manager: SessionManager::new(transport, storage, config),
        }
    }

    /// Restores a persisted session. Call once at startup; extra calls
    /// are no-ops.
    pub async fn initialize(&self) {
        self.manager.initialize().await;
    }

    /// Signs in. On failure the message is also available in
    /// [`state().error`](AuthState::error).
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<(), SessionwardError> {
        Ok(self.manager.login(identifier, secret).await?)
    }

    /// Registers, then signs in with the same credentials.
    pub async fn sign_up(
        &self,
        name: &str,
        identifier: &str,
        secret: &str,
    ) -> Result<(), SessionwardError> {
        Ok(self.manager.sign_up(name, identifier, secret).await?)
    }

    /// Signs out locally at once; the backend is notified in the background.
    pub fn logout(&self) {
        self.manager.logout();
    }

    /// Renews now instead of waiting for the timer.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.manager.refresh().await
    }

    pub fn state(&self) -> AuthState {
        self.manager.state()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.manager.state().user
    }

    pub fn is_authenticated(&self) -> bool {
        self.manager.state().is_authenticated()
    }

    /// Notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.manager.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.manager.phase()
    }

    /// The underlying manager, for scheduler and store introspection.
    pub fn manager(&self) -> &Arc<SessionManager<T, S>> {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods_update_config() {
        let builder = SessionClient::builder()
            .base_url("http://backend")
            .request_timeout(Duration::from_secs(7))
            .storage_path("s.json")
            .refresh_policy(RefreshPolicy {
                min_delay: Duration::from_secs(9),
                ..RefreshPolicy::default()
            });

        let config = builder.config();
        assert_eq!(config.base_url, "http://backend");
        assert_eq!(config.request_timeout, Duration::from_secs(7));
        assert_eq!(config.storage_path, Some(PathBuf::from("s.json")));
        assert_eq!(config.session.refresh.min_delay, Duration::from_secs(9));
    }

    #[test]
    fn test_memory_storage_clears_path() {
        let builder = SessionClientBuilder::new().storage_path("s.json").memory_storage();
        assert!(builder.config().storage_path.is_none());
    }

    #[test]
    fn test_build_starts_uninitialized() {
        let client = SessionClient::builder().build().unwrap();
        assert_eq!(client.phase(), SessionPhase::Uninitialized);
        assert!(client.state().loading);
        assert!(!client.is_authenticated());
    }
}
