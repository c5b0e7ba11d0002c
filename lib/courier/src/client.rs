//! Request dispatcher.
//!
//! [`Client`] is the single entry point of every outbound call. Each call:
//! 1. installs the default middlewares on first use (once per client),
//! 2. encodes its [`RequestOptions`] into a request,
//! 3. runs the middleware chain and hands the request to the transport,
//! 4. returns the response raw, or cast to `AppConfig::response_type`.
//!
//! ```ignore
//! use courier::prelude::*;
//!
//! let app = Arc::new(AppContext::new(
//!     AppConfig::builder()
//!         .base_url(Url::parse("https://api.example.com/")?)
//!         .build(),
//! ));
//! app.set_access_token(QueryAccessToken::new(token));
//!
//! let client = Client::new(app);
//! let menu = client.get("cgi-bin/menu/get", &json!({})).await?;
//! let user: User = client
//!     .get("cgi-bin/user/info", &json!({"openid": openid}))
//!     .await?
//!     .decode()?;
//! ```

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tower::{Layer, Service, ServiceExt};
use tracing::{Instrument, debug, info_span, warn};
use url::Url;

use crate::middleware::{
    ACCESS_TOKEN, AccessTokenMiddleware, Middleware, MiddlewareChain, MiddlewareLayer,
};
use crate::{
    Application, DefaultCaster, Error, Files, HyperTransport, Method, Reply, Request,
    RequestOptions, Response, ResponseCaster, Result, UploadForm,
};

/// Outbound HTTP client of an application.
///
/// The transport `T` is any tower service taking a [`Request`] and producing
/// a [`Response`]; it defaults to [`HyperTransport`]. Calls take `&self` and
/// may run concurrently.
pub struct Client<T = HyperTransport> {
    app: Arc<dyn Application>,
    transport: T,
    middlewares: Arc<MiddlewareChain>,
    caster: Arc<dyn ResponseCaster>,
}

impl<T: Clone> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            transport: self.transport.clone(),
            middlewares: Arc::clone(&self.middlewares),
            caster: Arc::clone(&self.caster),
        }
    }
}

impl<T> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", self.app.config())
            .field("middlewares", &self.middlewares)
            .finish_non_exhaustive()
    }
}

impl Client<HyperTransport> {
    /// Create a client sending through a [`HyperTransport`] built from
    /// the application's `http` configuration.
    #[must_use]
    pub fn new(app: Arc<dyn Application>) -> Self {
        let transport = HyperTransport::new(app.config().http.clone());
        Self::with_transport(app, transport)
    }
}

impl<T> Client<T> {
    /// Create a client over a custom transport.
    pub fn with_transport(app: Arc<dyn Application>, transport: T) -> Self {
        Self {
            app,
            transport,
            middlewares: Arc::new(MiddlewareChain::new()),
            caster: Arc::new(DefaultCaster),
        }
    }

    /// Replace the response caster.
    #[must_use]
    pub fn with_caster(mut self, caster: impl ResponseCaster + 'static) -> Self {
        self.caster = Arc::new(caster);
        self
    }

    /// The owning application.
    #[must_use]
    pub fn app(&self) -> &Arc<dyn Application> {
        &self.app
    }

    /// The middleware chain of this client.
    #[must_use]
    pub fn middlewares(&self) -> &MiddlewareChain {
        &self.middlewares
    }

    /// Append a middleware under `name`.
    ///
    /// Defaults installed later still run before it.
    pub fn push_middleware(&self, middleware: impl Middleware + 'static, name: impl Into<String>) {
        self.middlewares.push(middleware, name);
    }

    /// The transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    fn install_defaults(&self) {
        let app = Arc::clone(&self.app);
        let installed = self.middlewares.ensure_installed(move || {
            let access_token: Arc<dyn Middleware> = Arc::new(AccessTokenMiddleware::new(app));
            [(access_token, ACCESS_TOKEN.to_string())]
        });
        if installed {
            debug!(middlewares = ?self.middlewares.names(), "default middlewares installed");
        }
    }

    fn resolve_url(&self, url: &str) -> Result<Url> {
        match (Url::parse(url), &self.app.config().base_url) {
            (Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => {
                base.join(url).map_err(Error::InvalidUrl)
            }
            (parsed, _) => parsed.map_err(Error::InvalidUrl),
        }
    }
}

impl<T> Client<T>
where
    T: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    T::Future: Send,
{
    /// GET `url` with `query` as query string.
    pub async fn get(&self, url: &str, query: &impl Serialize) -> Result<Reply> {
        let options = RequestOptions::get(query)?;
        self.request(url, Method::Get, options, false).await
    }

    /// POST `data` to `url` as a form-urlencoded body.
    pub async fn post(&self, url: &str, data: &impl Serialize) -> Result<Reply> {
        let options = RequestOptions::post(data)?;
        self.request(url, Method::Post, options, false).await
    }

    /// POST `data` to `url` as a JSON body, with `query` as query string.
    pub async fn post_json(
        &self,
        url: &str,
        data: &impl Serialize,
        query: &impl Serialize,
    ) -> Result<Reply> {
        let options = RequestOptions::post_json(data, query)?;
        self.request(url, Method::Post, options, false).await
    }

    /// POST `files` and `form` to `url` as multipart/form-data.
    ///
    /// Uploads use a 30 second connect, read and total timeout.
    pub async fn upload(
        &self,
        url: &str,
        files: Option<&Files>,
        form: Option<&UploadForm>,
        query: &impl Serialize,
    ) -> Result<Reply> {
        let options = RequestOptions::upload(files, form, query)?;
        self.request(url, Method::Post, options, false).await
    }

    /// Send a request and return the transport response unchanged.
    pub async fn request_raw(
        &self,
        url: &str,
        method: Method,
        options: RequestOptions,
    ) -> Result<Reply> {
        self.request(url, method, options, true).await
    }

    /// Send a request.
    ///
    /// With `return_raw` the response is returned as [`Reply::Raw`] without
    /// looking at the configured response type. Otherwise it is cast by the
    /// client's [`ResponseCaster`].
    ///
    /// # Errors
    ///
    /// - [`Error::Middleware`] if a middleware failed; nothing was sent.
    /// - A transport error, unchanged and not retried.
    /// - [`Error::Cast`] if the response does not match the response type.
    pub async fn request(
        &self,
        url: &str,
        method: Method,
        options: RequestOptions,
        return_raw: bool,
    ) -> Result<Reply> {
        self.install_defaults();

        let url = self.resolve_url(url)?;
        let span = info_span!("http_request", method = %method, url = %url);

        async move {
            let request = options.into_request(method, url)?;
            let response = self.send(request).await?;

            if return_raw {
                return Ok(Reply::Raw(response));
            }

            let response_type = &self.app.config().response_type;
            self.caster.cast(response, response_type).inspect_err(|err| {
                warn!(response_type = %response_type, error = %err, "cannot cast response");
            })
        }
        .instrument(span)
        .await
    }

    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        debug!("sending request");

        let result = MiddlewareLayer::new(Arc::clone(&self.middlewares))
            .layer(self.transport.clone())
            .oneshot(request)
            .await;

        match &result {
            Ok(response) => debug!(status = response.status(), "response received"),
            Err(err) => warn!(error = %err, "request failed"),
        }
        result
    }
}
