//! Ordered middleware chain and its tower adapter.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::task::{Context, Poll};

use bytes::Bytes;
use tower::{Layer, Service};
use tracing::trace;

use super::Middleware;
use crate::{Error, Request, Response, Result};

#[derive(Clone)]
struct Entry {
    name: Arc<str>,
    middleware: Arc<dyn Middleware>,
}

/// Ordered, named middlewares of one client.
///
/// Pushing is allowed at any time. Defaults are installed once through
/// [`ensure_installed`](Self::ensure_installed); the installed marker is a
/// one-shot flag, independent of how many entries the chain holds.
#[derive(Default)]
pub struct MiddlewareChain {
    entries: RwLock<Vec<Entry>>,
    installed: OnceLock<()>,
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("names", &self.names())
            .field("installed", &self.is_installed())
            .finish()
    }
}

impl MiddlewareChain {
    /// An empty, not yet installed chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `middleware` under `name`.
    pub fn push(&self, middleware: impl Middleware + 'static, name: impl Into<String>) {
        self.push_arc(Arc::new(middleware), name);
    }

    /// Append a shared middleware under `name`.
    pub fn push_arc(&self, middleware: Arc<dyn Middleware>, name: impl Into<String>) {
        self.write().push(Entry {
            name: Arc::from(name.into()),
            middleware,
        });
    }

    /// Install `defaults` unless the chain was already installed.
    ///
    /// Defaults go in front of middlewares pushed earlier, keeping their own
    /// order. Concurrent callers wait for the first one; `defaults` runs at
    /// most once. Returns `true` if this call did the installation.
    pub fn ensure_installed<I>(&self, defaults: impl FnOnce() -> I) -> bool
    where
        I: IntoIterator<Item = (Arc<dyn Middleware>, String)>,
    {
        let mut installed_now = false;
        self.installed.get_or_init(|| {
            let defaults: Vec<Entry> = defaults()
                .into_iter()
                .map(|(middleware, name)| Entry {
                    name: Arc::from(name),
                    middleware,
                })
                .collect();
            trace!(count = defaults.len(), "installing default middlewares");
            let mut entries = self.write();
            let pushed = std::mem::replace(&mut *entries, defaults);
            entries.extend(pushed);
            installed_now = true;
        });
        installed_now
    }

    /// Mark the chain installed without adding defaults.
    ///
    /// Returns `false` if it was already installed.
    pub fn skip_defaults(&self) -> bool {
        self.installed.set(()).is_ok()
    }

    /// Returns `true` once defaults were installed or skipped.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.installed.get().is_some()
    }

    /// Number of middlewares.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if the chain holds no middleware.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Middleware names, in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.read().iter().map(|entry| entry.name.to_string()).collect()
    }

    /// Run every middleware against `request`, in order.
    ///
    /// Stops at the first failure, returned as [`Error::Middleware`].
    pub fn apply(&self, request: &mut Request<Bytes>) -> Result<()> {
        // Snapshot so a middleware may push without deadlocking.
        let entries = self.read().clone();

        for entry in entries {
            trace!(middleware = %entry.name, "modifying request");
            entry
                .middleware
                .modify_request(request)
                .map_err(|err| Error::middleware(entry.name.as_ref(), err))?;
        }
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Entry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Entry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Tower adapter
// ============================================================================

/// Layer that runs a [`MiddlewareChain`] before the wrapped service.
#[derive(Debug, Clone)]
pub struct MiddlewareLayer {
    chain: Arc<MiddlewareChain>,
}

impl MiddlewareLayer {
    /// Create a layer over `chain`.
    #[must_use]
    pub const fn new(chain: Arc<MiddlewareChain>) -> Self {
        Self { chain }
    }
}

impl<S> Layer<S> for MiddlewareLayer {
    type Service = ApplyMiddlewares<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApplyMiddlewares {
            inner,
            chain: Arc::clone(&self.chain),
        }
    }
}

/// Service that applies a [`MiddlewareChain`] and then calls the inner service.
#[derive(Debug, Clone)]
pub struct ApplyMiddlewares<S> {
    inner: S,
    chain: Arc<MiddlewareChain>,
}

impl<S> Service<Request<Bytes>> for ApplyMiddlewares<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Bytes>) -> Self::Future {
        if let Err(err) = self.chain.apply(&mut request) {
            return Box::pin(std::future::ready(Err(err)));
        }

        // Keep the service that was polled ready.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(request).await })
    }
}
