//! Error types for courier.
//!
//! Every failure is reported through [`Error`]. Callers that only care about
//! the pipeline stage that failed use [`Error::kind`].

use derive_more::{Display, Error, From};

// ============================================================================
// Error Kind
// ============================================================================

/// Stage of the request pipeline an [`Error`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// A middleware refused or failed to modify the outgoing request.
    #[display("middleware")]
    Middleware,
    /// Building, encoding or sending the request failed.
    #[display("transport")]
    Transport,
    /// The response could not be converted to the declared response type.
    #[display("cast")]
    Cast,
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for courier operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// A middleware failed while modifying the request. Nothing was sent.
    #[display("middleware `{name}` failed: {source}")]
    #[from(skip)]
    Middleware {
        /// Name the middleware was registered under.
        name: String,
        /// The error returned by the middleware.
        source: Box<Error>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Query string or form body serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_html_form::ser::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// Reading an upload file failed.
    #[display("I/O error: {_0}")]
    #[from]
    Io(std::io::Error),

    /// The response did not match the declared response type.
    #[display("cannot cast response to `{response_type}`: {message}")]
    #[from(skip)]
    Cast {
        /// The configured response type name.
        response_type: String,
        /// What went wrong.
        message: String,
    },
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an error returned by the middleware registered as `name`.
    #[must_use]
    pub fn middleware(name: impl Into<String>, source: Self) -> Self {
        Self::Middleware {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a cast error for the given response type.
    #[must_use]
    pub fn cast(response_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Cast {
            response_type: response_type.into(),
            message: message.into(),
        }
    }

    /// The pipeline stage this error belongs to.
    ///
    /// Serialization and file errors count as transport errors: they happen
    /// while the request is being put on the wire.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Middleware { .. } => ErrorKind::Middleware,
            Self::Cast { .. } | Self::JsonDeserialization { .. } => ErrorKind::Cast,
            Self::Connection(_)
            | Self::Tls(_)
            | Self::Timeout
            | Self::InvalidRequest(_)
            | Self::JsonSerialization(_)
            | Self::FormSerialization(_)
            | Self::InvalidUrl(_)
            | Self::Io(_) => ErrorKind::Transport,
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if a middleware aborted the call.
    #[must_use]
    pub const fn is_middleware(&self) -> bool {
        matches!(self, Self::Middleware { .. })
    }

    /// Returns `true` if the response could not be cast.
    #[must_use]
    pub const fn is_cast(&self) -> bool {
        matches!(self.kind(), ErrorKind::Cast)
    }
}
