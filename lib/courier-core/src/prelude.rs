//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    DefaultCaster, Error, ErrorKind, Files, Method, PartValue, Reply, Request, RequestOptions,
    Response, ResponseCaster, Result, UploadForm,
};
