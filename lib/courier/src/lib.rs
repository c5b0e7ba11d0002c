//! Outbound HTTP client for SDK-style APIs.
//!
//! Every call goes through one [`Client`]: options are encoded into a
//! request, a chain of request-modifying middlewares runs (the access token
//! middleware is installed on first use), the transport sends it, and the
//! response is returned raw or cast to the configured response type.
//!
//! # Example
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
//! let created = client
//!     .post_json("cgi-bin/menu/create", &menu, &json!({}))
//!     .await?;
//! ```

mod app;
mod client;
mod config;
mod connector;
pub mod middleware;
pub mod prelude;
mod transport;

pub use app::{AccessToken, AppContext, Application, BearerAccessToken, QueryAccessToken};
pub use client::Client;
pub use config::{
    AppConfig, AppConfigBuilder, ClientConfig, ClientConfigBuilder, DEFAULT_RESPONSE_TYPE,
    DEFAULT_TOKEN_KEY,
};
pub use transport::{HyperTransport, TransportFuture};

// Re-export tower for custom transports and layers
pub use tower;

// Re-export core types
pub use courier_core::{
    ContentType, DefaultCaster, Error, ErrorKind, Files, Method, MultipartPart, PartValue, Reply,
    Request, RequestBuilder, RequestOptions, Response, ResponseCaster, ResponseType, Result,
    Timeouts, UPLOAD_TIMEOUT, UploadForm, from_json, from_json_value, to_form, to_json,
    to_query_pairs,
};
pub use courier_core::multipart;

pub use url;
