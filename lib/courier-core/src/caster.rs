//! Response casting.
//!
//! In cast mode the dispatcher hands the transport response and the
//! configured `response_type` name to a [`ResponseCaster`]. The crate ships
//! [`DefaultCaster`], which understands the names listed on [`ResponseType`].

use std::str::FromStr;

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::{Error, Response, Result};

/// Result of a dispatched call.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The transport response, unchanged.
    Raw(Response<Bytes>),
    /// A JSON object body.
    Map(Map<String, Value>),
    /// Any JSON body.
    Json(Value),
    /// A UTF-8 body.
    Text(String),
}

impl Reply {
    /// The raw response, if this is a raw reply.
    #[must_use]
    pub const fn as_raw(&self) -> Option<&Response<Bytes>> {
        match self {
            Self::Raw(response) => Some(response),
            _ => None,
        }
    }

    /// Consume into the raw response, if this is a raw reply.
    #[must_use]
    pub fn into_raw(self) -> Option<Response<Bytes>> {
        match self {
            Self::Raw(response) => Some(response),
            _ => None,
        }
    }

    /// Decode this reply into a caller type.
    ///
    /// Raw and text replies are parsed as JSON.
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        match self {
            Self::Raw(response) => response.json(),
            Self::Map(map) => crate::from_json_value(Value::Object(map)),
            Self::Json(value) => crate::from_json_value(value),
            Self::Text(text) => crate::from_json(text.as_bytes()),
        }
    }
}

/// Response shapes known to [`DefaultCaster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseType {
    /// `array` or `map`: a JSON object.
    Map,
    /// `object` or `json`: any JSON value.
    Json,
    /// `text`: the body as a string.
    Text,
    /// `raw`: the response itself.
    Raw,
}

impl FromStr for ResponseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "array" | "map" => Ok(Self::Map),
            "object" | "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "raw" => Ok(Self::Raw),
            _ => Err(Error::cast(s, "unknown response type")),
        }
    }
}

/// Converts a response into the declared response type.
pub trait ResponseCaster: Send + Sync {
    /// Cast `response` to the shape named by `response_type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cast`] if the name is unknown or the body does not
    /// have the declared shape.
    fn cast(&self, response: Response<Bytes>, response_type: &str) -> Result<Reply>;
}

/// JSON-based [`ResponseCaster`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCaster;

impl ResponseCaster for DefaultCaster {
    fn cast(&self, response: Response<Bytes>, response_type: &str) -> Result<Reply> {
        let declared: ResponseType = response_type.parse()?;
        let as_cast_error = |err: Error| Error::cast(response_type, err.to_string());

        match declared {
            ResponseType::Raw => Ok(Reply::Raw(response)),
            ResponseType::Text => response
                .text()
                .map(Reply::Text)
                .map_err(|err| Error::cast(response_type, err.to_string())),
            ResponseType::Json => response.json().map(Reply::Json).map_err(as_cast_error),
            ResponseType::Map => match response.json::<Value>().map_err(as_cast_error)? {
                Value::Object(map) => Ok(Reply::Map(map)),
                other => Err(Error::cast(
                    response_type,
                    format!("expected a JSON object, got {}", json_kind(&other)),
                )),
            },
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
