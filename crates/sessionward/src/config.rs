//! Client configuration, with environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use sessionward_session::SessionConfig;
use sessionward_transport::HttpTransportConfig;

/// Base URL of the identity backend.
pub const ENV_BASE_URL: &str = "SESSIONWARD_BASE_URL";
/// Path of the JSON file holding the persisted session.
pub const ENV_STORAGE_PATH: &str = "SESSIONWARD_STORAGE_PATH";
/// Request timeout in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "SESSIONWARD_TIMEOUT_SECS";

/// Everything needed to build a [`SessionClient`](crate::SessionClient)
/// talking HTTP.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the identity backend.
    ///
    /// Default: `http://127.0.0.1:3000`.
    pub base_url: String,

    /// Upper bound for a single backend request.
    ///
    /// Default: 30 seconds.
    pub request_timeout: Duration,

    /// Where to persist the session. `None` keeps it in memory only, so
    /// every restart starts signed out.
    ///
    /// Default: `None`.
    pub storage_path: Option<PathBuf>,

    /// Session manager settings (renewal policy).
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let transport = HttpTransportConfig::default();
        Self {
            base_url: transport.base_url,
            request_timeout: transport.request_timeout,
            storage_path: None,
            session: SessionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `SESSIONWARD_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `SESSIONWARD_*` key. Empty values are ignored, as are timeouts
    /// that aren't a positive integer (with a warning).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.apply_lookup(lookup);
        config
    }

    /// Applies environment overrides on top of the current values.
    pub fn apply_env(&mut self) {
        self.apply_lookup(|key| std::env::var(key).ok());
    }

    fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_BASE_URL) {
            self.base_url = url.trim().to_string();
        }

        if let Some(path) = get(ENV_STORAGE_PATH) {
            self.storage_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    key = ENV_TIMEOUT_SECS,
                    value = %raw,
                    "ignoring invalid timeout"
                ),
            }
        }
    }

    /// The HTTP transport settings derived from this config.
    pub fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            base_url: self.base_url.clone(),
            request_timeout: self.request_timeout,
            ..HttpTransportConfig::default()
        }
    }
}
