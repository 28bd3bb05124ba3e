use std::collections::HashMap;

use crate::constraints::Constraints;
use crate::entry::{MultipartEntry, ReadMode};
use crate::handler::MultipartReadHandler;
use crate::helpers;
use crate::input::NioInput;

/// Called exactly once when a scan ends, with the error that stopped it if
/// any.
pub type Completion = Box<dyn FnOnce(crate::Result<()>) + Send>;

/// Called once per part, after its header block was read and before any of
/// its body bytes are released.
///
/// The handler picks how the body is consumed: one of the `read_*` methods of
/// [`MultipartEntry`], [`MultipartScanner::scan_part`] for a nested
/// multipart, or nothing at all, in which case the body is skipped.
///
/// Any `FnMut(&mut MultipartEntry) -> multiscan::Result<()>` closure is a
/// part handler.
pub trait PartHandler: Send {
    fn handle(&mut self, entry: &mut MultipartEntry) -> crate::Result<()>;
}

impl<F> PartHandler for F
where
    F: FnMut(&mut MultipartEntry) -> crate::Result<()> + Send,
{
    fn handle(&mut self, entry: &mut MultipartEntry) -> crate::Result<()> {
        self(entry)
    }
}

/// The parsed `Content-Type` of a multipart message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartContext {
    boundary: String,
    content_type: String,
    params: HashMap<String, String>,
}

impl MultipartContext {
    /// Parses a `multipart/*` content type. Parameter names are lowercased,
    /// quotes around values are stripped.
    pub fn parse(content_type: &str) -> crate::Result<MultipartContext> {
        let mime = content_type
            .parse::<mime::Mime>()
            .map_err(crate::Error::DecodeContentType)?;

        if mime.type_() != mime::MULTIPART {
            return Err(crate::Error::NoMultipart);
        }

        let params: HashMap<String, String> = mime
            .params()
            .map(|(name, value)| {
                (
                    name.as_str().to_ascii_lowercase(),
                    helpers::unquote(value.as_str()).to_owned(),
                )
            })
            .collect();

        let boundary = match params.get(mime::BOUNDARY.as_str()) {
            Some(boundary) if !boundary.is_empty() => boundary.clone(),
            _ => return Err(crate::Error::NoBoundary),
        };

        Ok(MultipartContext {
            boundary,
            content_type: content_type.to_owned(),
            params,
        })
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The content type as it was given.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }
}

/// Starts scans of multipart messages.
///
/// A scan registers a handler on a [`NioInput`] and returns right away. Parts
/// are reported to a [`PartHandler`] as the input makes their bytes ready,
/// and the completion callback runs once the final boundary was read or the
/// scan failed.
///
/// # Examples
///
/// ```
/// use multiscan::{MultipartEntry, MultipartScanner, StreamBuffer};
/// use std::sync::{Arc, Mutex};
///
/// let values = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&values);
///
/// let mut buffer = StreamBuffer::new();
/// MultipartScanner::new().scan(
///     &mut buffer,
///     Some("multipart/form-data; boundary=XYZ"),
///     move |entry: &mut MultipartEntry| {
///         let sink = Arc::clone(&sink);
///         entry.read_to_string(move |text| sink.lock().unwrap().push(text.unwrap()))
///     },
///     |result| assert!(result.is_ok()),
/// );
///
/// buffer.feed("--XYZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nfirst\r\n");
/// buffer.feed("--XYZ\r\nContent-Disposition: form-data; name=\"b\"\r\n\r\nsecond\r\n--XYZ--\r\n");
/// buffer.finish();
///
/// assert_eq!(*values.lock().unwrap(), vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MultipartScanner {
    constraints: Constraints,
}

impl MultipartScanner {
    pub fn new() -> Self {
        MultipartScanner::default()
    }

    /// Creates a scanner applying `constraints` to every scan, nested ones
    /// included.
    pub fn with_constraints(constraints: Constraints) -> Self {
        MultipartScanner { constraints }
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Scans a message read from `input`. `content_type` is the message's
    /// `Content-Type` header.
    ///
    /// An invalid content type is reported to `completion` immediately and
    /// leaves `input` untouched.
    pub fn scan<H, C>(&self, input: &mut dyn NioInput, content_type: Option<&str>, handler: H, completion: C)
    where
        H: PartHandler + 'static,
        C: FnOnce(crate::Result<()>) + Send + 'static,
    {
        let context = match content_type {
            Some(content_type) => MultipartContext::parse(content_type),
            None => Err(crate::Error::MissingContentType),
        };

        match context {
            Ok(context) => {
                debug!("scanning multipart message with boundary {:?}", context.boundary());

                let handler = self.handler(context, Box::new(handler), Box::new(completion));
                input.notify_available(Box::new(handler), 1);
            }
            Err(err) => completion(Err(err)),
        }
    }

    /// Scans the body of a part which is itself a multipart message, like a
    /// `multipart/mixed` part of a form. Meant to be called from the
    /// [`PartHandler`] of the enclosing scan.
    ///
    /// The nested scan reads the part as bytes, so it fails with
    /// [`Error::ReadModeConflict`](crate::Error::ReadModeConflict) when the
    /// part is already read as text. A failed nested scan only ends this
    /// part, the enclosing scan carries on with the next one.
    pub fn scan_part<H, C>(&self, entry: &mut MultipartEntry, handler: H, completion: C)
    where
        H: PartHandler + 'static,
        C: FnOnce(crate::Result<()>) + Send + 'static,
    {
        let context = MultipartContext::parse(entry.content_type()).and_then(|context| {
            entry.claim(ReadMode::Bytes)?;
            Ok(context)
        });

        match context {
            Ok(context) => {
                debug!(
                    "scanning nested multipart part {} with boundary {:?}",
                    entry.index(),
                    context.boundary()
                );

                let handler = self.handler(context, Box::new(handler), Box::new(completion));
                entry.register(Box::new(handler));
            }
            Err(err) => completion(Err(err)),
        }
    }

    fn handler(
        &self,
        context: MultipartContext,
        part_handler: Box<dyn PartHandler>,
        completion: Completion,
    ) -> MultipartReadHandler {
        MultipartReadHandler::new(context, self.constraints.clone(), part_handler, completion)
    }
}
