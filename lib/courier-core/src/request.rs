//! Outgoing HTTP request.
//!
//! A [`Request`] is what middlewares see and mutate before the transport
//! sends it. It is normally produced by
//! [`RequestOptions::into_request`](crate::RequestOptions::into_request).
//!
//! # Example
//!
//! ```
//! use courier_core::{Request, Method};
//! use bytes::Bytes;
//!
//! let request = Request::<Bytes>::builder(Method::Get, "https://api.example.com".parse().unwrap())
//!     .header("Accept", "application/json")
//!     .query("page", "1")
//!     .build();
//! ```

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;

use crate::{ContentType, Method};

/// Per-request timeouts. `None` means the transport default applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    /// Time allowed to establish the connection.
    pub connect: Option<Duration>,
    /// Time allowed to read the response body.
    pub read: Option<Duration>,
    /// Time allowed for the whole exchange up to the response head.
    pub total: Option<Duration>,
}

impl Timeouts {
    /// Returns `true` if no timeout is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.connect.is_none() && self.read.is_none() && self.total.is_none()
    }
}

/// An HTTP request with method, URL, headers, optional body and timeouts.
#[derive(Debug, Clone)]
pub struct Request<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<B>,
    timeouts: Timeouts,
}

impl<B> Request<B> {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder<B> {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Mutable access to the URL.
    #[must_use]
    pub fn url_mut(&mut self) -> &mut url::Url {
        &mut self.url
    }

    /// Appends a query parameter, keeping existing ones.
    pub fn append_query(&mut self, name: &str, value: &str) {
        self.url.query_pairs_mut().append_pair(name, value);
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    /// Single header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Sets a header, replacing any value stored under the same name in
    /// another case.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_header(&mut self.headers, name.into(), value.into());
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Timeouts requested for this call.
    #[must_use]
    pub const fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, HashMap<String, String>, Option<B>) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<B>,
    timeouts: Timeouts,
}

impl<B> RequestBuilder<B> {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: HashMap::new(),
            body: None,
            timeouts: Timeouts::default(),
        }
    }

    /// Sets a header, replacing any value with the same name in any case.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name.into(), value.into());
        self
    }

    /// Appends a query parameter to the URL.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(name, value);
        self
    }

    /// Appends multiple query parameters to the URL.
    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        {
            let mut query = self.url.query_pairs_mut();
            for (name, value) in pairs {
                query.append_pair(&name, &value);
            }
        }
        // An empty `query_pairs_mut` session leaves a dangling `?`.
        if self.url.query() == Some("") {
            self.url.set_query(None);
        }
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the timeouts.
    #[must_use]
    pub const fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request<B> {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            timeouts: self.timeouts,
        }
    }
}

fn set_header(headers: &mut HashMap<String, String>, name: String, value: String) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}

impl RequestBuilder<Bytes> {
    /// Set a JSON body.
    pub fn json<T: serde::Serialize>(self, value: &T) -> crate::Result<Self> {
        let body = crate::to_json(value)?;
        Ok(self.header("Content-Type", ContentType::Json.as_str()).body(body))
    }

    /// Set a form-urlencoded body.
    pub fn form<T: serde::Serialize>(self, value: &T) -> crate::Result<Self> {
        let body = crate::to_form(value)?;
        Ok(self
            .header("Content-Type", ContentType::FormUrlEncoded.as_str())
            .body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> url::Url {
        url::Url::parse(s).expect("valid URL")
    }

    #[test]
    fn request_builder_basic() {
        let request = Request::<Bytes>::builder(Method::Get, url("https://api.example.com/users"))
            .header("Accept", "application/json")
            .build();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url().as_str(), "https://api.example.com/users");
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert!(request.body().is_none());
        assert!(request.timeouts().is_empty());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let request = Request::builder(Method::Post, url("https://api.example.com/users"))
            .json(&serde_json::json!({"name": "test"}))
            .expect("json")
            .build();

        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn set_header_replaces_other_case() {
        let mut request = Request::<Bytes>::builder(Method::Get, url("https://api.example.com/"))
            .header("Content-Type", "application/json")
            .header("content-type", "text/plain")
            .build();
        assert_eq!(request.headers().len(), 1);

        request.set_header("CONTENT-TYPE", "application/xml");

        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.header("Content-Type"), Some("application/xml"));
    }

    #[test]
    fn append_query_keeps_existing_pairs() {
        let mut request =
            Request::<Bytes>::builder(Method::Get, url("https://api.example.com/a?x=1"))
                .query("y", "2")
                .build();

        request.append_query("access_token", "t0k");

        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/a?x=1&y=2&access_token=t0k"
        );
    }

    #[test]
    fn empty_query_pairs_leave_url_untouched() {
        let request = Request::<Bytes>::builder(Method::Get, url("https://api.example.com/a"))
            .query_pairs(Vec::new())
            .build();

        assert_eq!(request.url().as_str(), "https://api.example.com/a");
    }

    #[test]
    fn request_builder_json() {
        #[derive(serde::Serialize)]
        struct User {
            name: String,
        }

        let request = Request::builder(Method::Post, url("https://api.example.com/users"))
            .json(&User {
                name: "test".to_string(),
            })
            .expect("json")
            .build();

        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(
            request.body().map(Bytes::as_ref),
            Some(br#"{"name":"test"}"#.as_slice())
        );
    }
}
