//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use std::sync::Arc;

pub use crate::{
    AccessToken, AppConfig, AppContext, Application, BearerAccessToken, Client, ClientConfig,
    DefaultCaster, Error, ErrorKind, Files, Method, PartValue, QueryAccessToken, Reply,
    RequestOptions, Response, ResponseCaster, Result, UploadForm,
};
pub use serde::{Deserialize, Serialize};
pub use serde_json::json;
pub use url::Url;
