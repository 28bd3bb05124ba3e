//! A non-blocking, incremental parser for `multipart/*` bodies.
//!
//! Nothing here ever waits for bytes. A body is exposed through the
//! [`NioInput`] trait: whatever bytes are ready right now, plus a way to be
//! called back once more arrive. [`MultipartScanner`] installs a handler on
//! such an input that resumes the parse on every notification, reports each
//! part to a [`PartHandler`] once its headers are complete and releases the
//! part's body to whichever reader that handler chose, a byte reader, a text
//! reader or a nested scan.
//!
//! [`StreamBuffer`] is the input a transport pushes bytes into, and
//! [`Multipart`] drives one from any [`Stream`](futures_util::stream::Stream)
//! of byte chunks.
//!
//! # Examples
//!
//! ```
//! use multiscan::{MultipartEntry, MultipartScanner, StreamBuffer};
//!
//! let mut buffer = StreamBuffer::new();
//!
//! MultipartScanner::new().scan(
//!     &mut buffer,
//!     Some("multipart/form-data; boundary=X-BOUNDARY"),
//!     |entry: &mut MultipartEntry| {
//!         println!("Part {:?}, file name {:?}", entry.name(), entry.file_name());
//!         entry.read_to_bytes(|body| println!("Body: {:?}", body))
//!     },
//!     |result| println!("Scan finished: {:?}", result),
//! );
//!
//! // bytes as they come off the wire
//! buffer.feed("--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nab");
//! buffer.feed("cd\r\n--X-BOUNDARY--\r\n");
//! buffer.finish();
//! ```
//!
//! ## Optional features
//!
//! * `json`: Adds [`MultipartEntry::read_json`].
//! * `tokio-io`: Adds [`Multipart::with_reader`] for any `tokio::io::AsyncRead`.
//! * `log`: Emits diagnostics through the `log` crate.
//! * `all`: Enables `json`.

#![cfg_attr(nightly, feature(doc_cfg))]

#[cfg(feature = "log")]
macro_rules! trace {
    ($($arg:tt)+) => { log::trace!(target: "multiscan", $($arg)+) };
}

#[cfg(feature = "log")]
macro_rules! debug {
    ($($arg:tt)+) => { log::debug!(target: "multiscan", $($arg)+) };
}

#[cfg(feature = "log")]
macro_rules! warn {
    ($($arg:tt)+) => { log::warn!(target: "multiscan", $($arg)+) };
}

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($arg:tt)+) => {{
        let _ = format_args!($($arg)+);
    }};
}

#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($arg:tt)+) => {{
        let _ = format_args!($($arg)+);
    }};
}

#[cfg(not(feature = "log"))]
macro_rules! warn {
    ($($arg:tt)+) => {{
        let _ = format_args!($($arg)+);
    }};
}

pub use bytes;
pub use buffer::StreamBuffer;
pub use collect::{BytesCollector, TextCollector};
pub use constraints::{Constraints, HeaderPolicy};
pub use content_disposition::ContentDisposition;
pub use entry::{MultipartEntry, ReadMode};
pub use error::Error;
pub use headers::PartHeaders;
pub use input::{Interest, NioInput, ReadHandler};
pub use multipart::Multipart;
pub use scanner::{Completion, MultipartContext, MultipartScanner, PartHandler};
pub use size_limit::SizeLimit;
pub use text::{TextInput, TextReadHandler};

mod buffer;
mod collect;
mod constants;
mod constraints;
mod content_disposition;
mod entry;
mod error;
mod handler;
mod headers;
mod helpers;
mod input;
mod line;
mod multipart;
mod part_input;
mod scanner;
mod size_limit;
mod state;
mod text;

/// A Result type often returned from methods that can have `multiscan` errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Parses the `Content-Type` header to extract the boundary value.
///
/// Any `multipart/*` type is accepted, see [`MultipartContext::parse`].
///
/// # Examples
///
/// ```
/// # fn run(){
/// let content_type = "multipart/form-data; boundary=ABCDEFG";
///
/// assert_eq!(multiscan::parse_boundary(content_type), Ok("ABCDEFG".to_owned()));
/// # }
/// # run();
/// ```
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> Result<String> {
    MultipartContext::parse(content_type.as_ref()).map(|context| context.boundary().to_owned())
}
