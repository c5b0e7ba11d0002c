//! Multipart form data for uploads.
//!
//! [`upload_parts`] shapes the parts of an upload call: one part per file,
//! then at most one auxiliary form field. [`Form`] turns a list of parts into
//! a `multipart/form-data` body.
//!
//! # Example
//!
//! ```
//! use courier_core::multipart::{Files, PartValue, UploadForm, upload_parts};
//!
//! let mut files = Files::new();
//! files.insert("media".to_string(), PartValue::bytes(vec![0x89, 0x50]));
//!
//! let form = UploadForm::new("description", r#"{"title":"logo"}"#).with_filename("logo.png");
//! let parts = upload_parts(Some(&files), Some(&form));
//!
//! assert_eq!(parts.len(), 2);
//! assert_eq!(parts[1].name(), "description");
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Error, Result};

const CONTENT_DISPOSITION: &str = "Content-Disposition";
const CONTENT_TYPE: &str = "Content-Type";

/// Value of a multipart part: in-memory bytes or a file read at encode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    /// Raw bytes.
    Bytes(Bytes),
    /// Path of a file on disk.
    Path(PathBuf),
}

impl PartValue {
    /// In-memory value.
    #[must_use]
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Self::Bytes(data.into())
    }

    /// File value.
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    fn file_name(&self) -> Option<&str> {
        match self {
            Self::Bytes(_) => None,
            Self::Path(path) => path.file_name().and_then(|name| name.to_str()),
        }
    }

    fn load(&self) -> Result<Bytes> {
        match self {
            Self::Bytes(data) => Ok(data.clone()),
            Self::Path(path) => Ok(Bytes::from(std::fs::read(path)?)),
        }
    }
}

impl From<&str> for PartValue {
    fn from(value: &str) -> Self {
        Self::Bytes(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for PartValue {
    fn from(value: String) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<Vec<u8>> for PartValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<&Path> for PartValue {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<PathBuf> for PartValue {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

/// One named field of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    name: String,
    value: PartValue,
    headers: Vec<(String, String)>,
}

impl MultipartPart {
    /// Create a part without extra headers.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<PartValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            headers: Vec::new(),
        }
    }

    /// Add a header to this part.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Part name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Part value.
    #[must_use]
    pub const fn value(&self) -> &PartValue {
        &self.value
    }

    /// Extra headers, in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Header value by name, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Files of an upload call, keyed by field name.
pub type Files = BTreeMap<String, PartValue>;

/// The single auxiliary form field that may accompany uploaded files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: String,
    /// Filename announced for the file parts.
    pub filename: Option<String>,
}

impl UploadForm {
    /// Create a form field without filename.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            filename: None,
        }
    }

    /// Set the filename announced for the file parts.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// `Content-Disposition` value attached to uploaded file parts.
#[must_use]
pub fn media_disposition(filename: &str) -> String {
    format!(
        "form-data; name=\"media\"; filename=\"{}\"",
        escape_param(filename)
    )
}

/// Escape a quoted `Content-Disposition` parameter.
///
/// `"`, CR and LF are percent-encoded, as browsers do for form submissions.
fn escape_param(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Build the parts of an upload call.
///
/// File parts come first, in `files` order. When `form` is present every
/// file part carries a `Content-Disposition` naming `form.filename`, or a
/// random UUID when the caller gave none, and `form` itself is appended as
/// the last part. Both inputs absent yields no parts.
#[must_use]
pub fn upload_parts(files: Option<&Files>, form: Option<&UploadForm>) -> Vec<MultipartPart> {
    let disposition = form.map(|form| {
        let filename = form
            .filename
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        media_disposition(&filename)
    });

    let mut parts: Vec<MultipartPart> = files
        .into_iter()
        .flatten()
        .map(|(name, value)| {
            let part = MultipartPart::new(name.clone(), value.clone());
            match &disposition {
                Some(disposition) => part.with_header(CONTENT_DISPOSITION, disposition.clone()),
                None => part,
            }
        })
        .collect();

    if let Some(form) = form {
        parts.push(MultipartPart::new(form.name.clone(), form.value.clone()));
    }

    parts
}

// ============================================================================
// Body encoding
// ============================================================================

/// A `multipart/form-data` body under construction.
#[derive(Debug, Clone)]
pub struct Form {
    parts: Vec<MultipartPart>,
    boundary: String,
}

impl Form {
    /// Create a form over `parts` with a random boundary.
    #[must_use]
    pub fn new(parts: Vec<MultipartPart>) -> Self {
        Self {
            parts,
            boundary: format!("----CourierBoundary{}", uuid::Uuid::new_v4().simple()),
        }
    }

    /// Create a form with a fixed boundary.
    #[must_use]
    pub fn with_boundary(parts: Vec<MultipartPart>, boundary: impl Into<String>) -> Self {
        Self {
            parts,
            boundary: boundary.into(),
        }
    }

    /// Boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The `Content-Type` header value for this form.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode into (content-type header value, body bytes).
    ///
    /// File parts are read from disk here.
    pub fn into_body(self) -> Result<(String, Bytes)> {
        let content_type = self.content_type();
        let body = self.encode()?;
        Ok((content_type, body))
    }

    fn encode(&self) -> Result<Bytes> {
        let mut buf = BytesMut::new();

        for part in &self.parts {
            let data = part.value.load()?;

            buf.put_slice(b"--");
            buf.put_slice(self.boundary.as_bytes());
            buf.put_slice(b"\r\n");

            // A caller supplied disposition wins over the generated one.
            if part.header(CONTENT_DISPOSITION).is_none() {
                buf.put_slice(b"Content-Disposition: form-data; name=\"");
                buf.put_slice(escape_param(&part.name).as_bytes());
                buf.put_slice(b"\"");
                if let Some(filename) = part.value.file_name() {
                    buf.put_slice(b"; filename=\"");
                    buf.put_slice(escape_param(filename).as_bytes());
                    buf.put_slice(b"\"");
                }
                buf.put_slice(b"\r\n");
            }

            for (name, value) in &part.headers {
                if has_line_break(name) || has_line_break(value) {
                    return Err(Error::invalid_request(format!(
                        "multipart header `{}` of part `{}` contains a line break",
                        name.escape_debug(),
                        part.name.escape_debug()
                    )));
                }
                put_header(&mut buf, name, value);
            }

            if part.header(CONTENT_TYPE).is_none()
                && let Some(filename) = part.value.file_name()
            {
                put_header(&mut buf, CONTENT_TYPE, guess_content_type(filename));
            }

            buf.put_slice(b"\r\n");
            buf.put_slice(&data);
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(b"--");
        buf.put_slice(self.boundary.as_bytes());
        buf.put_slice(b"--\r\n");

        Ok(buf.freeze())
    }
}

fn has_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

fn put_header(buf: &mut BytesMut, name: &str, value: &str) {
    buf.put_slice(name.as_bytes());
    buf.put_slice(b": ");
    buf.put_slice(value.as_bytes());
    buf.put_slice(b"\r\n");
}

/// Guess the content type from a filename extension.
fn guess_content_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "amr" => "audio/amr",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
