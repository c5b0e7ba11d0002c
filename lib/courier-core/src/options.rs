//! Per-call request options.
//!
//! Each logical call shape (query GET, form POST, JSON POST, upload) has a
//! constructor producing a [`RequestOptions`]. The dispatcher turns options
//! into a [`Request`] with [`RequestOptions::into_request`].
//!
//! Caller values are captured as [`serde_json::Value`] and are not
//! validated here; a value the encoders cannot handle fails when the request
//! is built, as a transport error.

use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::multipart::{Files, Form, MultipartPart, UploadForm, upload_parts};
use crate::request::Timeouts;
use crate::{ContentType, Method, Request, Result};

/// Connect, read and total timeout applied to uploads.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Option keys, in canonical order.
const KEYS: [&str; 6] = [
    "query",
    "form_params",
    "multipart",
    "connect_timeout",
    "timeout",
    "read_timeout",
];

/// Options of a single call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Query string parameters.
    pub query: Option<Value>,
    /// Body parameters.
    pub form_params: Option<Value>,
    /// Multipart parts; when set, `form_params` is ignored.
    pub multipart: Option<Vec<MultipartPart>>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Total timeout.
    pub timeout: Option<Duration>,
    /// Body read timeout.
    pub read_timeout: Option<Duration>,
}

impl RequestOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options of a GET call: `{ query }`.
    pub fn get(query: &impl Serialize) -> Result<Self> {
        Ok(Self {
            query: Some(serde_json::to_value(query)?),
            ..Self::default()
        })
    }

    /// Options of a form POST: `{ form_params }`.
    pub fn post(data: &impl Serialize) -> Result<Self> {
        Ok(Self {
            form_params: Some(serde_json::to_value(data)?),
            ..Self::default()
        })
    }

    /// Options of a JSON POST: `{ query, form_params }`.
    ///
    /// Having both keys is what selects a JSON body.
    pub fn post_json(data: &impl Serialize, query: &impl Serialize) -> Result<Self> {
        Ok(Self {
            query: Some(serde_json::to_value(query)?),
            form_params: Some(serde_json::to_value(data)?),
            ..Self::default()
        })
    }

    /// Options of an upload: `{ query, multipart }` plus 30s timeouts.
    pub fn upload(
        files: Option<&Files>,
        form: Option<&UploadForm>,
        query: &impl Serialize,
    ) -> Result<Self> {
        Ok(Self {
            query: Some(serde_json::to_value(query)?),
            multipart: Some(upload_parts(files, form)),
            connect_timeout: Some(UPLOAD_TIMEOUT),
            timeout: Some(UPLOAD_TIMEOUT),
            read_timeout: Some(UPLOAD_TIMEOUT),
            ..Self::default()
        })
    }

    /// Keys present in these options, in canonical order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        let present = [
            self.query.is_some(),
            self.form_params.is_some(),
            self.multipart.is_some(),
            self.connect_timeout.is_some(),
            self.timeout.is_some(),
            self.read_timeout.is_some(),
        ];
        KEYS.into_iter()
            .zip(present)
            .filter_map(|(key, present)| present.then_some(key))
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys().any(|k| k == key)
    }

    /// Content type of the body these options produce, if any.
    #[must_use]
    pub fn body_type(&self) -> Option<ContentType> {
        match (&self.multipart, &self.query, &self.form_params) {
            (Some(_), _, _) | (None, _, None) => None,
            (None, Some(_), Some(_)) => Some(ContentType::Json),
            (None, None, Some(_)) => Some(ContentType::FormUrlEncoded),
        }
    }

    /// Timeouts carried by these options.
    #[must_use]
    pub const fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: self.connect_timeout,
            read: self.read_timeout,
            total: self.timeout,
        }
    }

    /// Encode into an outgoing request.
    ///
    /// Query values are appended to `url`. The body is, by priority:
    /// multipart when present, JSON when query and form params are both
    /// present, form-urlencoded otherwise.
    pub fn into_request(self, method: Method, url: url::Url) -> Result<Request<Bytes>> {
        let body_type = self.body_type();
        let timeouts = self.timeouts();

        let query = match &self.query {
            Some(query) => crate::to_query_pairs(query)?,
            None => Vec::new(),
        };
        let builder = Request::builder(method, url)
            .query_pairs(query)
            .timeouts(timeouts);

        let builder = match (self.multipart, self.form_params, body_type) {
            (Some(parts), _, _) => {
                let (content_type, body) = Form::new(parts).into_body()?;
                builder.header("Content-Type", content_type).body(body)
            }
            (None, Some(data), Some(ContentType::Json)) => builder.json(&data)?,
            (None, Some(data), _) => builder.form(&data)?,
            (None, None, _) => builder,
        };

        Ok(builder.build())
    }
}
