//! Request-modifying middlewares.
//!
//! A [`Middleware`] mutates the outgoing request before it is sent. A
//! client owns one [`MiddlewareChain`]: an ordered list of named
//! middlewares, run in registration order. The first error aborts the call
//! before anything reaches the transport.
//!
//! The client installs its default middlewares (currently only
//! [`AccessTokenMiddleware`]) on first use, exactly once, even when several
//! tasks race on the first call.
//!
//! The chain is put in front of the transport with [`MiddlewareLayer`]:
//!
//! ```ignore
//! use courier::middleware::{MiddlewareChain, MiddlewareLayer};
//! use tower::{Layer, ServiceExt};
//!
//! let chain = Arc::new(MiddlewareChain::new());
//! chain.push(|request: &mut Request<Bytes>| {
//!     request.set_header("X-Trace", "1");
//!     Ok(())
//! }, "trace");
//!
//! let response = MiddlewareLayer::new(chain)
//!     .layer(transport)
//!     .oneshot(request)
//!     .await?;
//! ```

mod access_token;
mod chain;

pub use access_token::{ACCESS_TOKEN, AccessTokenMiddleware};
pub use chain::{ApplyMiddlewares, MiddlewareChain, MiddlewareLayer};

use bytes::Bytes;

use crate::{Request, Result};

/// A step that mutates an outgoing request before it is sent.
pub trait Middleware: Send + Sync {
    /// Modify `request` in place.
    ///
    /// # Errors
    ///
    /// An error aborts the call; the request is not sent.
    fn modify_request(&self, request: &mut Request<Bytes>) -> Result<()>;
}

impl<F> Middleware for F
where
    F: Fn(&mut Request<Bytes>) -> Result<()> + Send + Sync,
{
    fn modify_request(&self, request: &mut Request<Bytes>) -> Result<()> {
        self(request)
    }
}
