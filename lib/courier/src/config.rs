//! Client and application configuration.
//!
//! [`ClientConfig`] tunes the transport. [`AppConfig`] is the application
//! level configuration the dispatcher and the access-token middleware read:
//! the `response_type` used in cast mode, the query key tokens are sent
//! under, and an optional base URL for relative paths.

use std::time::Duration;

use url::Url;

/// Default `response_type`: JSON object bodies.
pub const DEFAULT_RESPONSE_TYPE: &str = "array";

/// Default query key for access tokens.
pub const DEFAULT_TOKEN_KEY: &str = "access_token";

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Time allowed until the response head arrives, unless the call sets its own.
    pub timeout: Duration,
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Time allowed to read the response body, unless the call sets its own.
    pub read_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Set the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the body read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            read_timeout: self.read_timeout.unwrap_or(defaults.read_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
        }
    }
}

/// Application configuration read by the client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name of the shape responses are cast to (see `courier_core::ResponseType`).
    pub response_type: String,
    /// Query key used by [`QueryAccessToken`](crate::QueryAccessToken).
    pub token_key: String,
    /// Base URL relative call paths are resolved against.
    pub base_url: Option<Url>,
    /// Transport configuration.
    pub http: ClientConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            response_type: DEFAULT_RESPONSE_TYPE.to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            base_url: None,
            http: ClientConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// Builder for [`AppConfig`].
#[derive(Debug, Clone, Default)]
pub struct AppConfigBuilder {
    response_type: Option<String>,
    token_key: Option<String>,
    base_url: Option<Url>,
    http: Option<ClientConfig>,
}

impl AppConfigBuilder {
    /// Set the response type used in cast mode.
    #[must_use]
    pub fn response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    /// Set the query key access tokens are sent under.
    #[must_use]
    pub fn token_key(mut self, token_key: impl Into<String>) -> Self {
        self.token_key = Some(token_key.into());
        self
    }

    /// Set the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set the transport configuration.
    #[must_use]
    pub fn http(mut self, http: ClientConfig) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> AppConfig {
        let defaults = AppConfig::default();
        AppConfig {
            response_type: self.response_type.unwrap_or(defaults.response_type),
            token_key: self.token_key.unwrap_or(defaults.token_key),
            base_url: self.base_url.or(defaults.base_url),
            http: self.http.unwrap_or(defaults.http),
        }
    }
}
