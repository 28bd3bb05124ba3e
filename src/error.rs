use std::fmt::{self, Debug, Display, Formatter};

use derive_more::Display;

use crate::entry::ReadMode;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while scanning a multipart stream and in
/// other operations.
#[derive(Display)]
#[non_exhaustive]
pub enum Error {
    /// An unknown field is detected when multipart
    /// [`constraints`](crate::Constraints::allowed_fields) are added.
    #[display(fmt = "unknown field received: {}", "field_name.as_deref().unwrap_or(\"<unknown>\")")]
    UnknownField { field_name: Option<String> },

    /// The part data ended before its closing boundary was found.
    #[display(
        fmt = "field '{}' received with incomplete data",
        "field_name.as_deref().unwrap_or(\"<unknown>\")"
    )]
    IncompleteFieldData { field_name: Option<String> },

    /// The input ended inside a part's header block.
    #[display(fmt = "failed to read field complete headers")]
    IncompleteHeaders,

    /// A header line without a name was found and the
    /// [`HeaderPolicy`](crate::HeaderPolicy) is `Reject`.
    #[display(fmt = "malformed part header line: {:?}", line)]
    MalformedHeader { line: String },

    /// [`PartHeaders::to_header_map`](crate::PartHeaders::to_header_map) met a
    /// name that is not a valid [`HeaderName`](http::header::HeaderName).
    #[display(fmt = "failed to decode field's raw header name: {:?} {}", name, cause)]
    DecodeHeaderName { name: String, cause: BoxError },

    /// [`PartHeaders::to_header_map`](crate::PartHeaders::to_header_map) met a
    /// value that is not a valid [`HeaderValue`](http::header::HeaderValue).
    #[display(fmt = "failed to decode field's raw header value: {}", cause)]
    DecodeHeaderValue { value: Vec<u8>, cause: BoxError },

    /// A part carried more headers than allowed.
    #[display(fmt = "header number exceed the limit {}", limit)]
    TooManyHeaders { limit: usize },

    /// A part's header block exceeded the maximum size limit.
    #[display(fmt = "header block exceeded the maximum size limit: {} bytes", limit)]
    HeaderSizeExceeded { limit: usize },

    /// Multipart stream is incomplete.
    #[display(fmt = "incomplete multipart stream")]
    IncompleteStream,

    /// The incoming field size exceeded the maximum limit.
    #[display(
        fmt = "field '{}' exceeded the maximum size limit: {} bytes",
        "field_name.as_deref().unwrap_or(\"<unknown>\")",
        limit
    )]
    FieldSizeExceeded { limit: u64, field_name: Option<String> },

    /// The incoming stream size exceeded the maximum limit.
    #[display(fmt = "stream size exceeded the maximum limit: {} bytes", limit)]
    StreamSizeExceeded { limit: u64 },

    /// Stream read failed.
    #[display(fmt = "stream read failed: {}", _0)]
    StreamReadFailed(BoxError),

    /// The input was closed before the scan completed.
    #[display(fmt = "input stream is closed")]
    StreamClosed,

    /// The body has no `Content-Type`.
    #[display(fmt = "Content-Type is missing")]
    MissingContentType,

    /// The `Content-Type` is not `multipart/*`.
    #[display(fmt = "Content-Type is not multipart")]
    NoMultipart,

    /// Failed to convert the `Content-Type` to [`mime::Mime`] type.
    #[display(fmt = "Failed to convert Content-Type to `mime::Mime` type: {}", _0)]
    DecodeContentType(mime::FromStrError),

    /// No boundary found in `Content-Type` header.
    #[display(fmt = "multipart boundary not found in Content-Type")]
    NoBoundary,

    /// The `Content-Disposition` of a part could not be parsed.
    #[display(fmt = "failed to parse Content-Disposition {:?}: {}", value, reason)]
    DecodeContentDisposition { value: String, reason: String },

    /// The part body was requested in a second, different read mode.
    #[display(fmt = "part body is already read as {}, can't read it as {}", current, requested)]
    ReadModeConflict { current: ReadMode, requested: ReadMode },

    /// An application handler failed.
    #[display(fmt = "handler failed: {}", _0)]
    Handler(BoxError),

    /// Failed to decode the part data as `JSON` in
    /// [`read_json`](crate::MultipartEntry::read_json) method.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    #[display(fmt = "failed to decode field data as JSON: {}", _0)]
    DecodeJson(serde_json::Error),
}

impl Error {
    /// Wraps an application error so it can be returned from a handler.
    pub fn handler<E: Into<BoxError>>(err: E) -> Self {
        Error::Handler(err.into())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}
