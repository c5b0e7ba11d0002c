//! The owning application as seen by the client.
//!
//! The client never reaches for globals: it holds an [`Application`] and asks
//! it for the current access token and for its [`AppConfig`]. How tokens are
//! fetched or refreshed is the application's business.

use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;

use crate::{AppConfig, Error, Request, Result};

/// Capability the client borrows from the owning application.
pub trait Application: Send + Sync {
    /// The current access token, if the application has one.
    fn access_token(&self) -> Option<Arc<dyn AccessToken>>;

    /// Application configuration.
    fn config(&self) -> &AppConfig;
}

/// A credential that knows how to attach itself to a request.
pub trait AccessToken: Send + Sync {
    /// Attach the token to `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be represented in the request.
    fn apply_to_request(&self, request: &mut Request<Bytes>, config: &AppConfig) -> Result<()>;
}

/// Token sent as a query parameter named by [`AppConfig::token_key`].
#[derive(Debug, Clone)]
pub struct QueryAccessToken {
    token: Arc<str>,
}

impl QueryAccessToken {
    /// Create a query token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::from(token.into()),
        }
    }
}

impl AccessToken for QueryAccessToken {
    fn apply_to_request(&self, request: &mut Request<Bytes>, config: &AppConfig) -> Result<()> {
        request.append_query(&config.token_key, &self.token);
        Ok(())
    }
}

/// Token sent as `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerAccessToken {
    token: Arc<str>,
}

impl BearerAccessToken {
    /// Create a bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::from(token.into()),
        }
    }
}

impl AccessToken for BearerAccessToken {
    fn apply_to_request(&self, request: &mut Request<Bytes>, _config: &AppConfig) -> Result<()> {
        let value = format!("Bearer {}", self.token);
        http::HeaderValue::from_str(&value)
            .map_err(|_| Error::invalid_request("access token is not a valid header value"))?;

        request.set_header("Authorization", value);
        Ok(())
    }
}

/// A ready-made [`Application`]: fixed configuration and a replaceable token.
pub struct AppContext {
    config: AppConfig,
    token: RwLock<Option<Arc<dyn AccessToken>>>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("has_token", &self.access_token().is_some())
            .finish()
    }
}

impl AppContext {
    /// Create an application without token.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            token: RwLock::new(None),
        }
    }

    /// Replace the current token.
    pub fn set_access_token(&self, token: impl AccessToken + 'static) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(token));
    }

    /// Drop the current token.
    pub fn clear_access_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Application for AppContext {
    fn access_token(&self) -> Option<Arc<dyn AccessToken>> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn config(&self) -> &AppConfig {
        &self.config
    }
}
