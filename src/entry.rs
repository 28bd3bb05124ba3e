use std::fmt::{self, Debug, Formatter};

use bytes::Bytes;
use derive_more::Display;
use encoding_rs::{Encoding, UTF_8};
use http::header;
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;

use crate::collect::{BytesCollector, TextCollector};
use crate::constants;
use crate::content_disposition::ContentDisposition;
use crate::headers::PartHeaders;
use crate::helpers;
use crate::input::{NioInput, ReadHandler, Registration};
use crate::part_input::PartInput;
use crate::text::{TextAdapter, TextReadHandler};

/// How the body of a part is consumed. A part can only be read one way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ReadMode {
    #[display(fmt = "bytes")]
    Bytes,
    #[display(fmt = "text")]
    Text,
}

/// One part of a multipart message.
///
/// A single entry is reused for every part of a message: the scanner fills in
/// the headers, hands the entry to the [`PartHandler`](crate::PartHandler),
/// releases body bytes to whichever reader was chosen there, and resets it
/// once the part's closing boundary went by.
///
/// Body bytes are tracked in two counters measured from the input's read
/// cursor: `available` bytes are confirmed content the reader may consume,
/// the `reserved` bytes after them are the latest line terminator, withheld
/// because it belongs to the next boundary line if one follows.
pub struct MultipartEntry {
    headers: PartHeaders,
    content_type: String,
    content_disposition: Option<ContentDisposition>,
    index: usize,
    pub(crate) available: usize,
    pub(crate) reserved: usize,
    /// Bytes released over the part's lifetime.
    pub(crate) released: u64,
    pub(crate) finished: bool,
    pub(crate) skipping: bool,
    mode: Option<ReadMode>,
    pub(crate) registration: Option<Registration>,
}

impl MultipartEntry {
    pub(crate) fn new() -> Self {
        MultipartEntry {
            headers: PartHeaders::new(),
            content_type: constants::DEFAULT_CONTENT_TYPE.to_owned(),
            content_disposition: None,
            index: 0,
            available: 0,
            reserved: 0,
            released: 0,
            finished: false,
            skipping: false,
            mode: None,
            registration: None,
        }
    }

    /// The part headers in the order received, names lowercased.
    pub fn headers(&self) -> &PartHeaders {
        &self.headers
    }

    /// The first value of a header, if it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The part's `Content-Type`, `text/plain; charset=US-ASCII` when absent.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The part's `Content-Type` as [`mime::Mime`].
    pub fn mime(&self) -> Option<mime::Mime> {
        self.content_type.parse::<mime::Mime>().ok()
    }

    /// Whether the part is itself a multipart message that can be scanned with
    /// [`MultipartScanner::scan_part`](crate::MultipartScanner::scan_part).
    pub fn is_multipart(&self) -> bool {
        self.mime().map_or(false, |mime| mime.type_() == mime::MULTIPART)
    }

    pub fn content_disposition(&self) -> Option<&ContentDisposition> {
        self.content_disposition.as_ref()
    }

    /// The `name` parameter of the `Content-Disposition`. `None` when the
    /// header is missing or malformed.
    pub fn name(&self) -> Option<&str> {
        self.content_disposition.as_ref().and_then(|cd| cd.name().ok().flatten())
    }

    /// The `filename` parameter of the `Content-Disposition`. `None` when the
    /// header is missing or malformed.
    pub fn file_name(&self) -> Option<&str> {
        self.content_disposition
            .as_ref()
            .and_then(|cd| cd.file_name().ok().flatten())
    }

    /// The position of the part in its message, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Body bytes released to the reader and not consumed yet.
    pub fn available_bytes(&self) -> usize {
        self.available
    }

    /// Scanned body bytes withheld until the next line shows they are not
    /// part of a boundary.
    pub fn reserved_bytes(&self) -> usize {
        self.reserved
    }

    /// Whether the part's closing boundary was found.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_skipping(&self) -> bool {
        self.skipping
    }

    /// Discards the part body. This is what happens to a part no reader was
    /// chosen for.
    pub fn skip(&mut self) {
        self.skipping = true;
        self.registration = None;
    }

    /// Reads the part body as bytes through `handler`. The handler receives a
    /// [`NioInput`] bounded to this part.
    pub fn read_bytes<H: ReadHandler + 'static>(&mut self, handler: H) -> crate::Result<()> {
        self.claim(ReadMode::Bytes)?;
        self.register(Box::new(handler));
        Ok(())
    }

    /// Reads the part body as text through `handler`, decoded with the
    /// `charset` of the part's content type, UTF-8 if it has none.
    pub fn read_text<H: TextReadHandler + 'static>(&mut self, handler: H) -> crate::Result<()> {
        self.read_text_with_charset(handler, constants::DEFAULT_CHARSET)
    }

    /// Like [`read_text`](MultipartEntry::read_text) with a fallback charset
    /// used when the content type names none.
    pub fn read_text_with_charset<H: TextReadHandler + 'static>(
        &mut self,
        handler: H,
        default_charset: &str,
    ) -> crate::Result<()> {
        let encoding = self.encoding(default_charset);

        self.claim(ReadMode::Text)?;
        self.register(Box::new(TextAdapter::new(encoding, handler)));
        Ok(())
    }

    /// Collects the whole body and passes it to `callback` once the part is
    /// complete, or passes the error that stopped it.
    pub fn read_to_bytes<F>(&mut self, callback: F) -> crate::Result<()>
    where
        F: FnOnce(crate::Result<Bytes>) + Send + 'static,
    {
        self.read_bytes(BytesCollector::new(callback))
    }

    /// Collects the whole body as text, see [`read_text`](MultipartEntry::read_text).
    pub fn read_to_string<F>(&mut self, callback: F) -> crate::Result<()>
    where
        F: FnOnce(crate::Result<String>) + Send + 'static,
    {
        self.read_text(TextCollector::new(callback))
    }

    /// Collects the whole body and deserializes it as JSON.
    ///
    /// # Optional
    ///
    /// This requires the optional `json` feature to be enabled.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub fn read_json<T, F>(&mut self, callback: F) -> crate::Result<()>
    where
        T: DeserializeOwned,
        F: FnOnce(crate::Result<T>) + Send + 'static,
    {
        self.read_to_bytes(move |result| {
            callback(result.and_then(|bytes| serde_json::from_slice(&bytes).map_err(crate::Error::DecodeJson)))
        })
    }

    pub(crate) fn append_header(&mut self, name: &[u8], value: &[u8]) {
        self.headers.append(name, value);
    }

    /// Takes the content type and disposition out of the parsed headers.
    pub(crate) fn begin(&mut self, index: usize) {
        self.index = index;

        if let Some(content_type) = self.headers.get_bytes(header::CONTENT_TYPE.as_str()) {
            self.content_type = String::from_utf8_lossy(content_type).into_owned();
        }

        self.content_disposition = self
            .headers
            .get_bytes(header::CONTENT_DISPOSITION.as_str())
            .map(|value| ContentDisposition::new(String::from_utf8_lossy(value)));
    }

    pub(crate) fn has_reader(&self) -> bool {
        self.mode.is_some() || self.skipping
    }

    pub(crate) fn claim(&mut self, mode: ReadMode) -> crate::Result<()> {
        match self.mode {
            Some(current) if current != mode => Err(crate::Error::ReadModeConflict {
                current,
                requested: mode,
            }),
            _ => {
                self.mode = Some(mode);
                self.skipping = false;
                Ok(())
            }
        }
    }

    pub(crate) fn register(&mut self, handler: Box<dyn ReadHandler>) {
        self.registration = Some(Registration::new(handler, 1));
    }

    /// Moves `released` scanned bytes into `available` and withholds the
    /// next `reserved` ones.
    pub(crate) fn release(&mut self, released: usize, reserved: usize) {
        self.available += released;
        self.reserved = reserved;
        self.released += released as u64;
    }

    /// Hands available bytes to the reader, or drops them when skipping.
    pub(crate) fn deliver(&mut self, input: &mut dyn NioInput) {
        if self.skipping {
            self.available -= input.skip(self.available);
        } else {
            PartInput::new(input, self).dispatch();
        }
    }

    /// The closing boundary was found. The reserved terminator belongs to it.
    pub(crate) fn finish(&mut self) {
        self.finished = true;
        self.reserved = 0;
    }

    /// Tells the reader its part will not complete.
    pub(crate) fn abort(&mut self) {
        if let Some(registration) = self.registration.take() {
            let field_name = self.name().map(|name| name.to_owned());
            registration.fail(crate::Error::IncompleteFieldData { field_name });
        }
    }

    /// Returns the entry to its freshly created state, keeping allocations.
    pub(crate) fn reset(&mut self) {
        self.headers.clear();
        self.content_type.clear();
        self.content_type.push_str(constants::DEFAULT_CONTENT_TYPE);
        self.content_disposition = None;
        self.index = 0;
        self.available = 0;
        self.reserved = 0;
        self.released = 0;
        self.finished = false;
        self.skipping = false;
        self.mode = None;
        self.registration = None;
    }

    fn encoding(&self, default_charset: &str) -> &'static Encoding {
        let mime = self.mime();
        let label = mime
            .as_ref()
            .and_then(|mime| mime.get_param(mime::CHARSET))
            .map(|charset| charset.as_str())
            .unwrap_or(default_charset);

        Encoding::for_label(helpers::unquote(label).as_bytes()).unwrap_or(UTF_8)
    }
}

impl Debug for MultipartEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartEntry")
            .field("headers", &self.headers)
            .field("content_type", &self.content_type)
            .field("content_disposition", &self.content_disposition)
            .field("index", &self.index)
            .field("available", &self.available)
            .field("reserved", &self.reserved)
            .field("released", &self.released)
            .field("finished", &self.finished)
            .field("skipping", &self.skipping)
            .field("mode", &self.mode)
            .field("registration", &self.registration)
            .finish()
    }
}
