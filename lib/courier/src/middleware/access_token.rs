//! Access token middleware.
//!
//! Asks the application for its current token and lets the token attach
//! itself to the request. Without a token the request goes out as is; the
//! remote API decides whether that is acceptable.

use std::sync::Arc;

use bytes::Bytes;
use tracing::trace;

use super::Middleware;
use crate::{Application, Request, Result};

/// Name the access token middleware is registered under.
pub const ACCESS_TOKEN: &str = "access_token";

/// Middleware that applies the application's current access token.
#[derive(Clone)]
pub struct AccessTokenMiddleware {
    app: Arc<dyn Application>,
}

impl std::fmt::Debug for AccessTokenMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenMiddleware").finish_non_exhaustive()
    }
}

impl AccessTokenMiddleware {
    /// Create the middleware for `app`.
    #[must_use]
    pub fn new(app: Arc<dyn Application>) -> Self {
        Self { app }
    }
}

impl Middleware for AccessTokenMiddleware {
    fn modify_request(&self, request: &mut Request<Bytes>) -> Result<()> {
        let Some(token) = self.app.access_token() else {
            trace!("no access token, sending request without credentials");
            return Ok(());
        };

        token.apply_to_request(request, self.app.config())
    }
}
