//! Core types for the courier SDK client.
//!
//! This crate holds everything that does not need a runtime:
//! - [`Method`] - HTTP method enum
//! - [`Request`] and [`RequestBuilder`] - the outgoing request middlewares mutate
//! - [`Response`] - the transport response envelope
//! - [`RequestOptions`] - per-call options for each call shape
//! - [`multipart`] - upload parts and multipart body encoding
//! - [`ResponseCaster`], [`DefaultCaster`] and [`Reply`] - raw or cast results
//! - [`Error`], [`ErrorKind`] and [`Result`] - error handling

mod body;
mod caster;
mod error;
mod method;
pub mod multipart;
mod options;
pub mod prelude;
mod request;
mod response;

pub use body::{ContentType, from_json, from_json_value, to_form, to_json, to_query_pairs};
pub use caster::{DefaultCaster, Reply, ResponseCaster, ResponseType};
pub use error::{Error, ErrorKind, Result};
pub use method::Method;
pub use multipart::{Files, MultipartPart, PartValue, UploadForm};
pub use options::{RequestOptions, UPLOAD_TIMEOUT};
pub use request::{Request, RequestBuilder, Timeouts};
pub use response::Response;
