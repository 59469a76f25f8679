//! HTTP transport implementation using `reqwest`.
//!
//! The short-lived credential travels as an HTTP-only cookie set by the
//! backend, so the client keeps a cookie store and never sees its value.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use sessionward_protocol::{
    Codec, JsonCodec, LoginRequest, RegisterRequest, RenewRequest, RenewalGrant,
    UserProfile,
};

use crate::{SessionTransport, TransportError};

const LOGIN_PATH: &str = "/auth/login";
const REFRESH_PATH: &str = "/auth/refresh";
const PROFILE_PATH: &str = "/auth/me";
const LOGOUT_PATH: &str = "/auth/logout";
const REGISTER_PATH: &str = "/auth/register";

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL of the identity backend, without a trailing slash
    /// (one is stripped if present), e.g. `https://id.example.com/api`.
    pub base_url: String,

    /// Upper bound for a single request, connect included.
    ///
    /// Default: 30 seconds.
    pub request_timeout: Duration,

    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("sessionward/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A [`SessionTransport`] that talks JSON over HTTP.
pub struct HttpTransport<C: Codec = JsonCodec> {
    http: reqwest::Client,
    base_url: String,
    codec: C,
}

impl HttpTransport<JsonCodec> {
    /// Builds a JSON transport.
    ///
    /// # Errors
    /// [`TransportError::Network`] if the HTTP client can't be built
    /// (e.g. the TLS backend failed to initialize).
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        Self::with_codec(config, JsonCodec)
    }
}

impl<C: Codec> HttpTransport<C> {
    /// Builds a transport with a custom body codec.
    pub fn with_codec(config: HttpTransportConfig, codec: C) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        tracing::debug!(%base_url, "HTTP session transport ready");

        Ok(Self {
            http,
            base_url,
            codec,
        })
    }

    /// The normalized base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and returns the body of a 2xx response.
    ///
    /// Non-2xx responses become [`TransportError::Rejected`] with the
    /// message taken from the error body when there is one.
    async fn call<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Vec<u8>, TransportError> {
        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, self.codec.content_type())
                .body(self.codec.encode(body)?);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        tracing::trace!(%method, path, status = status.as_u16(), "identity backend answered");

        if status.is_success() {
            return Ok(bytes.to_vec());
        }

        let message = self
            .codec
            .error_message(&bytes)
            .unwrap_or_else(|| reason(status));
        Err(TransportError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn call_for_grant<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<RenewalGrant, TransportError> {
        let bytes = self.call(Method::POST, path, Some(body)).await?;
        let grant: RenewalGrant = self.codec.decode(&bytes)?;
        Ok(grant.validate()?)
    }
}

impl<C: Codec> SessionTransport for HttpTransport<C> {
    async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<RenewalGrant, TransportError> {
        let body = LoginRequest {
            email: identifier.to_string(),
            password: secret.to_string(),
        };
        self.call_for_grant(LOGIN_PATH, &body).await
    }

    async fn renew(&self, renewal_token: &str) -> Result<RenewalGrant, TransportError> {
        let body = RenewRequest {
            refresh_token: renewal_token.to_string(),
        };
        self.call_for_grant(REFRESH_PATH, &body).await
    }

    async fn fetch_profile(&self) -> Result<UserProfile, TransportError> {
        let bytes = self.call::<()>(Method::GET, PROFILE_PATH, None).await?;
        Ok(self.codec.decode(&bytes)?)
    }

    async fn terminate(&self) -> Result<(), TransportError> {
        self.call::<()>(Method::POST, LOGOUT_PATH, None).await?;
        Ok(())
    }

    async fn register(
        &self,
        name: &str,
        identifier: &str,
        secret: &str,
    ) -> Result<(), TransportError> {
        let body = RegisterRequest {
            name: name.to_string(),
            email: identifier.to_string(),
            password: secret.to_string(),
        };
        self.call(Method::POST, REGISTER_PATH, Some(&body)).await?;
        Ok(())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_decode() {
        TransportError::InvalidResponse(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

fn reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_strips_trailing_slash() {
        let transport = HttpTransport::new(HttpTransportConfig {
            base_url: "http://id.example.com/api/".into(),
            ..HttpTransportConfig::default()
        })
        .unwrap();
        assert_eq!(transport.base_url(), "http://id.example.com/api");
        assert_eq!(transport.url(LOGIN_PATH), "http://id.example.com/api/auth/login");
    }

    #[test]
    fn test_reason_known_status() {
        assert_eq!(reason(StatusCode::UNAUTHORIZED), "Unauthorized");
    }

    #[test]
    fn test_default_config_timeout_is_thirty_seconds() {
        let cfg = HttpTransportConfig::default();
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert!(cfg.user_agent.starts_with("sessionward/"));
    }
}
