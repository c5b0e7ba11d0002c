//! Body and query serialization utilities.

use bytes::Bytes;

use crate::Result;

/// Content type of an encoded request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use courier_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Menu { name: String }
///
/// let menu = Menu { name: "home".to_string() };
/// let bytes = to_json(&menu).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"home"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded bytes.
///
/// Uses `serde_html_form`, so `Vec<T>` fields become repeated keys.
///
/// # Example
///
/// ```
/// use courier_core::to_form;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Login { username: String, password: String }
///
/// let login = Login { username: "alice".to_string(), password: "secret".to_string() };
/// let bytes = to_form(&login).expect("serialize");
/// assert_eq!(bytes.as_ref(), b"username=alice&password=secret");
/// ```
pub fn to_form<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_html_form::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Serialize a value to decoded query pairs, in serialization order.
///
/// `null` yields no pairs.
pub fn to_query_pairs(value: &serde_json::Value) -> Result<Vec<(String, String)>> {
    if value.is_null() {
        return Ok(Vec::new());
    }

    let encoded = serde_html_form::to_string(value)?;
    Ok(url::form_urlencoded::parse(encoded.as_bytes())
        .into_owned()
        .collect())
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Example
///
/// ```
/// use courier_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct Token { access_token: String }
///
/// let token: Token = from_json(br#"{"access_token":"abc"}"#).expect("deserialize");
/// assert_eq!(token.access_token, "abc");
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

/// Like [`from_json`], for an already parsed JSON value.
pub fn from_json_value<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Json.as_str(), "application/json");
        assert_eq!(
            ContentType::FormUrlEncoded.to_string(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn to_form_with_vec() {
        #[derive(serde::Serialize)]
        struct Tagging {
            openid: String,
            tags: Vec<String>,
        }

        let item = Tagging {
            openid: "o1".to_string(),
            tags: vec!["vip".to_string(), "new".to_string()],
        };

        let bytes = to_form(&item).expect("serialize");
        assert_eq!(bytes.as_ref(), b"openid=o1&tags=vip&tags=new");
    }

    #[test]
    fn query_pairs_from_object() {
        let pairs = to_query_pairs(&json!({"type": "image", "note": "a b"})).expect("pairs");

        assert!(pairs.contains(&("type".to_string(), "image".to_string())));
        assert!(pairs.contains(&("note".to_string(), "a b".to_string())));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn query_pairs_from_null_is_empty() {
        assert!(to_query_pairs(&serde_json::Value::Null)
            .expect("pairs")
            .is_empty());
    }

    #[test]
    fn query_pairs_reject_scalars() {
        let err = to_query_pairs(&json!("just a string")).expect_err("scalar query");
        assert_eq!(err.kind(), crate::ErrorKind::Transport);
    }

    #[test]
    fn from_json_missing_field_error_with_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Media {
            #[allow(dead_code)]
            media_id: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct Upload {
            #[allow(dead_code)]
            item: Media,
        }

        let err = from_json::<Upload>(br#"{"item":{}}"#).expect_err("should fail");
        let msg = err.to_string();
        assert!(msg.contains("item"), "Expected path 'item' in error: {msg}");
        assert!(msg.contains("media_id"), "Expected field in error: {msg}");
    }

    #[test]
    fn from_json_value_reports_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Counts {
            #[allow(dead_code)]
            total: u32,
        }

        let err = from_json_value::<Counts>(json!({"total": "many"})).expect_err("should fail");
        assert!(err.to_string().contains("total"));
    }
}
