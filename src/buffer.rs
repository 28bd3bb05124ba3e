use bytes::{Buf, BytesMut};

use crate::constants;
use crate::input::{Fired, NioInput, ReadHandler, Registration};

/// The body source a transport feeds bytes into.
///
/// Bytes handed to [`feed`](StreamBuffer::feed) accumulate until a handler
/// skips them. Every feed notifies the registered [`ReadHandler`] once its
/// threshold is met, and [`finish`](StreamBuffer::finish) delivers the final
/// `on_all_data_read`.
///
/// # Examples
///
/// ```
/// use multiscan::{MultipartScanner, StreamBuffer};
///
/// let mut buffer = StreamBuffer::new();
///
/// MultipartScanner::new().scan(
///     &mut buffer,
///     Some("multipart/form-data; boundary=X-BOUNDARY"),
///     |entry: &mut multiscan::MultipartEntry| entry.read_to_string(|text| println!("{:?}", text)),
///     |result| println!("scan finished: {:?}", result),
/// );
///
/// buffer.feed("--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n");
/// buffer.feed("abcd\r\n--X-BOUNDARY--\r\n");
/// buffer.finish();
/// ```
#[derive(Debug)]
pub struct StreamBuffer {
    buf: BytesMut,
    eof: bool,
    closed: bool,
    received: u64,
    whole_stream_limit: u64,
    registration: Option<Registration>,
    dispatching: bool,
}

impl StreamBuffer {
    pub fn new() -> Self {
        StreamBuffer::with_limit(constants::DEFAULT_WHOLE_STREAM_SIZE_LIMIT)
    }

    /// Creates a buffer that fails once more than `whole_stream_limit` bytes
    /// were fed.
    pub fn with_limit(whole_stream_limit: u64) -> Self {
        StreamBuffer {
            buf: BytesMut::new(),
            eof: false,
            closed: false,
            received: 0,
            whole_stream_limit,
            registration: None,
            dispatching: false,
        }
    }

    /// Appends bytes received from the transport.
    pub fn feed<T: AsRef<[u8]>>(&mut self, data: T) {
        let data = data.as_ref();

        if self.eof || self.closed {
            debug!("dropping {} bytes fed after the end of input", data.len());
            return;
        }

        self.received += data.len() as u64;
        if self.received > self.whole_stream_limit {
            self.fail(crate::Error::StreamSizeExceeded {
                limit: self.whole_stream_limit,
            });
            return;
        }

        self.buf.extend_from_slice(data);
        self.dispatch();
    }

    /// Marks the end of input.
    pub fn finish(&mut self) {
        if self.eof || self.closed {
            return;
        }

        self.eof = true;
        self.dispatch();
    }

    /// Reports a transport failure to the registered handler and closes the
    /// buffer.
    pub fn fail(&mut self, err: crate::Error) {
        match self.registration.take() {
            Some(registration) => registration.fail(err),
            None => warn!("input failed with no handler registered: {}", err),
        }

        self.close();
    }

    /// Force-closes the buffer: pending bytes are dropped, the registered
    /// handler is released and later feeds are ignored.
    pub fn close(&mut self) {
        self.closed = true;
        self.buf.clear();
        self.registration = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn dispatch(&mut self) {
        if self.dispatching {
            return;
        }
        self.dispatching = true;

        while let Some(registration) = self.registration.take() {
            if self.closed {
                break;
            }

            if !registration.is_ready(&*self) {
                self.registration = Some(registration);
                break;
            }

            let before = self.buf.len();
            match registration.fire(self) {
                Fired::Parked(registration) => {
                    let stalled = self.buf.len() == before;
                    if self.registration.is_none() {
                        self.registration = Some(registration);
                    }
                    if stalled {
                        break;
                    }
                }
                Fired::Done => {}
                Fired::Failed => self.close(),
            }
        }

        self.dispatching = false;
    }
}

impl Default for StreamBuffer {
    fn default() -> Self {
        StreamBuffer::new()
    }
}

impl NioInput for StreamBuffer {
    fn ready_bytes(&self) -> usize {
        self.buf.len()
    }

    fn is_at_end(&self) -> bool {
        self.eof || self.closed
    }

    fn chunk(&self) -> &[u8] {
        &self.buf
    }

    fn skip(&mut self, n: usize) -> usize {
        let n = std::cmp::min(n, self.buf.len());
        self.buf.advance(n);
        n
    }

    fn notify_available(&mut self, handler: Box<dyn ReadHandler>, threshold: usize) {
        if self.closed {
            Registration::new(handler, threshold).fail(crate::Error::StreamClosed);
            return;
        }

        self.registration = Some(Registration::new(handler, threshold));
        self.dispatch();
    }
}
