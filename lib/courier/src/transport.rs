//! HTTP transport using hyper-util.
//!
//! [`HyperTransport`] is the default transport of [`Client`](crate::Client).
//! Any `tower::Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>`
//! can take its place.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower_service::Service;

use crate::{
    ClientConfig, Error, Request, Response, Result, Timeouts, connector::https_connector,
};

/// Future type of the transport service.
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

type Pool = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Transport with connection pooling and TLS.
///
/// Per-request timeouts override the configured ones: `connect` bounds
/// establishing the connection, `total` bounds the wait for the response
/// head, `read` bounds reading the body.
///
/// The connect timeout lives on the connector, so a call asking for a
/// connect timeout other than the configured one is sent through a pool
/// built for that duration. Those pools are created on first use and shared
/// by clones.
#[derive(Clone)]
pub struct HyperTransport {
    inner: Pool,
    pools: Arc<RwLock<HashMap<Duration, Pool>>>,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with `config`.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let inner = Self::build_pool(&config, config.connect_timeout);

        Self {
            inner,
            pools: Arc::default(),
            config,
        }
    }

    fn build_pool(config: &ClientConfig, connect_timeout: Duration) -> Pool {
        let connector = https_connector(connect_timeout);

        Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector)
    }

    /// Connect timeout applied to a call with `timeouts`.
    #[must_use]
    pub fn connect_timeout_for(&self, timeouts: Timeouts) -> Duration {
        timeouts.connect.unwrap_or(self.config.connect_timeout)
    }

    /// Time allowed until the response head arrives for a call with `timeouts`.
    ///
    /// Never shorter than an explicit per-call connect timeout.
    #[must_use]
    pub fn total_timeout_for(&self, timeouts: Timeouts) -> Duration {
        let total = timeouts.total.unwrap_or(self.config.timeout);
        timeouts.connect.map_or(total, |connect| total.max(connect))
    }

    /// Pool whose connector uses `connect_timeout`.
    fn pool_for(&self, connect_timeout: Duration) -> Pool {
        if connect_timeout == self.config.connect_timeout {
            return self.inner.clone();
        }

        if let Some(pool) = self
            .pools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&connect_timeout)
        {
            return pool.clone();
        }

        self.pools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(connect_timeout)
            .or_insert_with(|| Self::build_pool(&self.config, connect_timeout))
            .clone()
    }

    /// Transport configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a hyper request from a courier request.
    fn build_hyper_request(request: Request<Bytes>) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();

        let body = body.map_or_else(Full::default, Full::new);
        let mut hyper_request = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str())
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))?;

        // One value per header name, whatever the case it was set with.
        for (name, value) in &headers {
            let name = http::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_request(e.to_string()))?;
            let value = http::HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_request(e.to_string()))?;
            hyper_request.headers_mut().insert(name, value);
        }

        Ok(hyper_request)
    }

    /// Collect response headers, keeping repeated ones.
    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, Vec<String>> {
        let mut extracted: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            if let Ok(value) = value.to_str() {
                extracted
                    .entry(name.to_string())
                    .or_default()
                    .push(value.to_string());
            }
        }
        extracted
    }

    /// Send `request` and buffer the response.
    pub async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let timeouts = request.timeouts();
        let total = self.total_timeout_for(timeouts);
        let read = timeouts.read.unwrap_or(self.config.read_timeout);
        let pool = self.pool_for(self.connect_timeout_for(timeouts));

        let hyper_request = Self::build_hyper_request(request)?;

        let response = tokio::time::timeout(total, pool.request(hyper_request))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let response_headers = Self::extract_headers(response.headers());

        let body = tokio::time::timeout(read, response.into_body().collect())
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(Response::new(status, response_headers, body))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = err.to_string();

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Service<Request<Bytes>> for HyperTransport {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = TransportFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move { transport.execute(request).await })
    }
}
